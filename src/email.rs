use crate::config::OtpConfig;
use crate::errors::GateError;
use askama::Template;
use async_trait::async_trait;
use lettre::message::SinglePart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::error;

pub const OTP_SUBJECT: &str = "Verify Your Email";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Sends an HTML message.
    async fn send_email(&self, recipient: &str, subject: &str, body: &str)
        -> Result<(), GateError>;
}

pub struct LettreEmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    from_name: String,
}

impl LettreEmailSender {
    /// STARTTLS relay by default; with `smtp_starttls` off the connection is
    /// plaintext, for local catchers such as Mailpit.
    pub fn new(config: &OtpConfig) -> Result<Self, GateError> {
        let builder = if config.smtp_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
                .map_err(|e| GateError::ConfigError(format!("Invalid SMTP host: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_server)
        };
        let mut builder = builder.port(config.smtp_port);

        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            mailer: builder.build(),
            from_email: config.mail_from.clone(),
            from_name: config.mail_from_name.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for LettreEmailSender {
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), GateError> {
        let email = Message::builder()
            .from(
                format!("{} <{}>", self.from_name, self.from_email)
                    .parse()
                    .map_err(|e| GateError::EmailError(format!("Invalid from address: {}", e)))?,
            )
            .to(recipient
                .parse()
                .map_err(|e| GateError::EmailError(format!("Invalid to address: {}", e)))?)
            .subject(subject)
            .singlepart(SinglePart::html(body.to_string()))
            .map_err(|e| GateError::EmailError(format!("Failed to build email: {}", e)))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| GateError::EmailError(format!("Failed to send email: {}", e)))?;
        Ok(())
    }
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Activate your account</title></head>
<body style="font-family: Arial, sans-serif; color: #333;">
    <p>Hi {{ name }},</p>
    <p>Thanks for signing up. Use the code below to activate your account:</p>
    <p style="font-size: 24px; font-weight: bold; letter-spacing: 4px;">{{ otp }}</p>
    <p>The code expires in {{ expires_in_minutes }} minutes.</p>
</body>
</html>
"#,
    ext = "html"
)]
struct ActivationMail<'a> {
    name: &'a str,
    otp: &'a str,
    expires_in_minutes: u64,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Reset your password</title></head>
<body style="font-family: Arial, sans-serif; color: #333;">
    <p>Hi {{ name }},</p>
    <p>We received a request to reset your password. Your verification code is:</p>
    <p style="font-size: 24px; font-weight: bold; letter-spacing: 4px;">{{ otp }}</p>
    <p>The code expires in {{ expires_in_minutes }} minutes. If you did not ask for this, you can ignore this email.</p>
</body>
</html>
"#,
    ext = "html"
)]
struct PasswordResetMail<'a> {
    name: &'a str,
    otp: &'a str,
    expires_in_minutes: u64,
}

/// Which message an OTP is delivered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TemplateKey {
    #[serde(rename = "user-activation-mail")]
    UserActivation,
    #[serde(rename = "forgot-password-user-mail")]
    ForgotPasswordUser,
    #[serde(rename = "forgot-password-seller-mail")]
    ForgotPasswordSeller,
}

impl TemplateKey {
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateKey::UserActivation => "user-activation-mail",
            TemplateKey::ForgotPasswordUser => "forgot-password-user-mail",
            TemplateKey::ForgotPasswordSeller => "forgot-password-seller-mail",
        }
    }

    /// Renders the HTML body. The display name is escaped.
    pub fn render(
        self,
        display_name: &str,
        otp: &str,
        expires_in_secs: u64,
    ) -> Result<String, GateError> {
        let expires_in_minutes = expires_in_secs.div_ceil(60);
        let rendered = match self {
            TemplateKey::UserActivation => ActivationMail {
                name: display_name,
                otp,
                expires_in_minutes,
            }
            .render(),
            TemplateKey::ForgotPasswordUser | TemplateKey::ForgotPasswordSeller => {
                PasswordResetMail {
                    name: display_name,
                    otp,
                    expires_in_minutes,
                }
                .render()
            }
        };
        rendered.map_err(|e| {
            GateError::EmailError(format!("Failed to render {}: {}", self.as_str(), e))
        })
    }
}

impl FromStr for TemplateKey {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user-activation-mail" => Ok(TemplateKey::UserActivation),
            "forgot-password-user-mail" => Ok(TemplateKey::ForgotPasswordUser),
            "forgot-password-seller-mail" => Ok(TemplateKey::ForgotPasswordSeller),
            other => Err(GateError::Validation(format!("Unknown template: {}", other))),
        }
    }
}

/// Renders OTP messages and reports delivery as a plain success flag.
pub struct OtpMailer {
    sender: Arc<dyn EmailSender>,
    expires_in_secs: u64,
}

impl OtpMailer {
    pub fn new(sender: Arc<dyn EmailSender>, expires_in_secs: u64) -> Self {
        Self {
            sender,
            expires_in_secs,
        }
    }

    pub async fn send_otp(
        &self,
        recipient: &str,
        display_name: &str,
        template: TemplateKey,
        otp: &str,
    ) -> bool {
        let body = match template.render(display_name, otp, self.expires_in_secs) {
            Ok(body) => body,
            Err(e) => {
                error!(template = template.as_str(), "{}", e);
                return false;
            }
        };
        match self.sender.send_email(recipient, OTP_SUBJECT, &body).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    recipient,
                    template = template.as_str(),
                    "Error sending OTP email: {}",
                    e
                );
                false
            }
        }
    }
}

#[cfg(test)]
#[derive(Clone, Default)]
pub struct TestEmailSender {
    pub sent_emails: std::sync::Arc<std::sync::Mutex<Vec<(String, String, String)>>>,
}

#[cfg(test)]
impl TestEmailSender {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
#[async_trait]
impl EmailSender for TestEmailSender {
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), GateError> {
        self.sent_emails.lock().unwrap().push((
            recipient.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}
