use crate::errors::GateError;

#[derive(Debug, Clone)]
pub struct OtpConfig {
    pub otp_expiry_seconds: u64,
    pub otp_cooldown_seconds: u64,
    pub request_window_seconds: u64,
    pub otp_requests_per_window: u32,
    pub spam_lock_seconds: u64,
    /// The failure that reaches this count locks the account.
    pub otp_max_verify_attempts: u32,
    pub lock_seconds: u64,
    pub otp_length: u32,
    pub storage_type: StorageType,
    pub redis_url: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_starttls: bool,
    pub smtp_username: String,
    pub smtp_password: String,
    pub mail_from: String,
    pub mail_from_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StorageType {
    Memory,
    Redis,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            otp_expiry_seconds: 300,
            otp_cooldown_seconds: 30,
            request_window_seconds: 60,
            otp_requests_per_window: 2,
            spam_lock_seconds: 3600,
            otp_max_verify_attempts: 3,
            lock_seconds: 1800,
            otp_length: 4,
            storage_type: StorageType::Redis,
            redis_url: "redis://127.0.0.1/".to_string(),
            smtp_server: "localhost".to_string(),
            smtp_port: 1025,
            smtp_starttls: true,
            smtp_username: "".to_string(),
            smtp_password: "".to_string(),
            mail_from: "noreply@example.com".to_string(),
            mail_from_name: "Auth Service".to_string(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, GateError> {
    match std::env::var(name) {
        Ok(val) => val
            .parse()
            .map(Some)
            .map_err(|_| GateError::ConfigError(format!("Invalid {}", name))),
        Err(_) => Ok(None),
    }
}

impl OtpConfig {
    pub fn from_env() -> Result<Self, GateError> {
        let mut config = Self::default();

        if let Some(val) = parse_var("OTP_EXPIRY_SECONDS")? {
            config.otp_expiry_seconds = val;
        }
        if let Some(val) = parse_var("OTP_COOLDOWN_SECONDS")? {
            config.otp_cooldown_seconds = val;
        }
        if let Some(val) = parse_var("OTP_REQUEST_WINDOW_SECONDS")? {
            config.request_window_seconds = val;
        }
        if let Some(val) = parse_var("OTP_REQUESTS_PER_WINDOW")? {
            config.otp_requests_per_window = val;
        }
        if let Some(val) = parse_var("OTP_SPAM_LOCK_SECONDS")? {
            config.spam_lock_seconds = val;
        }
        if let Some(val) = parse_var("OTP_MAX_VERIFY_ATTEMPTS")? {
            config.otp_max_verify_attempts = val;
        }
        if let Some(val) = parse_var("OTP_LOCK_SECONDS")? {
            config.lock_seconds = val;
        }
        if let Some(val) = parse_var("OTP_LENGTH")? {
            config.otp_length = val;
        }

        if let Ok(val) = std::env::var("STORAGE_TYPE") {
            config.storage_type = match val.to_lowercase().as_str() {
                "memory" => StorageType::Memory,
                "redis" => StorageType::Redis,
                _ => {
                    return Err(GateError::ConfigError(
                        "Invalid STORAGE_TYPE: must be 'memory' or 'redis'".to_string(),
                    ))
                }
            };
        }

        if config.storage_type == StorageType::Redis {
            config.redis_url = match std::env::var("REDIS_URL") {
                Ok(url) => url,
                Err(_) => {
                    let redis_host = std::env::var("REDIS_HOST")
                        .map_err(|_| GateError::ConfigError("REDIS_HOST must be set".to_string()))?;
                    let redis_port = std::env::var("REDIS_PORT")
                        .map_err(|_| GateError::ConfigError("REDIS_PORT must be set".to_string()))?;
                    format!("redis://{}:{}/", redis_host, redis_port)
                }
            };
        }

        config.smtp_server = std::env::var("SMTP_HOST")
            .map_err(|_| GateError::ConfigError("SMTP_HOST must be set".to_string()))?;
        config.smtp_port = parse_var("SMTP_PORT")?
            .ok_or_else(|| GateError::ConfigError("SMTP_PORT must be set".to_string()))?;

        if let Some(val) = parse_var("SMTP_STARTTLS")? {
            config.smtp_starttls = val;
        }
        if let Ok(val) = std::env::var("SMTP_USERNAME") {
            config.smtp_username = val;
        }
        if let Ok(val) = std::env::var("SMTP_PASSWORD") {
            config.smtp_password = val;
        }

        config.mail_from = std::env::var("SMTP_MAIL_FROM")
            .map_err(|_| GateError::ConfigError("SMTP_MAIL_FROM must be set".to_string()))?;
        config.mail_from_name = std::env::var("SMTP_MAIL_FROM_NAME")
            .map_err(|_| GateError::ConfigError("SMTP_MAIL_FROM_NAME must be set".to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GateError> {
        let ttls = [
            ("OTP_EXPIRY_SECONDS", self.otp_expiry_seconds),
            ("OTP_COOLDOWN_SECONDS", self.otp_cooldown_seconds),
            ("OTP_REQUEST_WINDOW_SECONDS", self.request_window_seconds),
            ("OTP_SPAM_LOCK_SECONDS", self.spam_lock_seconds),
            ("OTP_LOCK_SECONDS", self.lock_seconds),
        ];
        if let Some((name, _)) = ttls.iter().find(|(_, secs)| *secs == 0) {
            return Err(GateError::ConfigError(format!("{} must be positive", name)));
        }
        if self.otp_requests_per_window == 0 {
            return Err(GateError::ConfigError(
                "OTP_REQUESTS_PER_WINDOW must be positive".to_string(),
            ));
        }
        if self.otp_max_verify_attempts == 0 {
            return Err(GateError::ConfigError(
                "OTP_MAX_VERIFY_ATTEMPTS must be positive".to_string(),
            ));
        }
        if !(4..=9).contains(&self.otp_length) {
            return Err(GateError::ConfigError(
                "OTP_LENGTH must be between 4 and 9".to_string(),
            ));
        }
        Ok(())
    }

    /// Inclusive bounds of generated codes, e.g. 1000..=9999 for length 4.
    pub fn otp_range(&self) -> std::ops::RangeInclusive<u32> {
        let low = 10u32.pow(self.otp_length - 1);
        let high = 10u32.pow(self.otp_length) - 1;
        low..=high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = OtpConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.otp_range(), 1000..=9999);
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let config = OtpConfig {
            otp_max_verify_attempts: 0,
            ..OtpConfig::default()
        };
        assert!(matches!(config.validate(), Err(GateError::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_bad_length() {
        let config = OtpConfig {
            otp_length: 12,
            ..OtpConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env_rejects_invalid_starttls() {
        std::env::set_var("STORAGE_TYPE", "memory");
        std::env::set_var("SMTP_HOST", "localhost");
        std::env::set_var("SMTP_PORT", "587");
        std::env::set_var("SMTP_MAIL_FROM", "noreply@example.com");
        std::env::set_var("SMTP_MAIL_FROM_NAME", "Auth Service");

        std::env::set_var("SMTP_STARTTLS", "yes please");
        let result = OtpConfig::from_env();
        assert!(matches!(result, Err(GateError::ConfigError(msg)) if msg == "Invalid SMTP_STARTTLS"));

        std::env::set_var("SMTP_STARTTLS", "false");
        assert!(!OtpConfig::from_env().unwrap().smtp_starttls);

        for name in [
            "STORAGE_TYPE",
            "SMTP_HOST",
            "SMTP_PORT",
            "SMTP_MAIL_FROM",
            "SMTP_MAIL_FROM_NAME",
            "SMTP_STARTTLS",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_six_digit_range() {
        let config = OtpConfig {
            otp_length: 6,
            ..OtpConfig::default()
        };
        assert_eq!(config.otp_range(), 100_000..=999_999);
    }
}
