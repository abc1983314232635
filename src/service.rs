use crate::config::OtpConfig;
use crate::email::{EmailSender, OtpMailer, TemplateKey};
use crate::errors::GateError;
use crate::keys::{OtpKey, LOCK_SENTINEL};
use crate::rate_limit::RequestTracker;
use crate::restrictions::RestrictionChecker;
use crate::state::{OtpPhase, OtpState};
use crate::storage::{OtpCheck, Storage};
use rand::Rng;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct OtpService {
    pub config: OtpConfig,
    storage: Arc<dyn Storage>,
    mailer: OtpMailer,
    restrictions: RestrictionChecker,
    tracker: RequestTracker,
}

impl OtpService {
    pub fn new(
        config: OtpConfig,
        storage: Arc<dyn Storage>,
        email_sender: Arc<dyn EmailSender>,
    ) -> Result<Self, GateError> {
        config.validate()?;
        let restrictions = RestrictionChecker::new(storage.clone());
        let tracker = RequestTracker::new(storage.clone(), config.clone());
        let mailer = OtpMailer::new(email_sender, config.otp_expiry_seconds);
        Ok(Self {
            config,
            storage,
            mailer,
            restrictions,
            tracker,
        })
    }

    pub async fn check_restrictions(&self, email: &str) -> Result<(), GateError> {
        self.restrictions.check_restrictions(email).await
    }

    pub async fn track_request(&self, email: &str) -> Result<(), GateError> {
        self.tracker.track_request(email).await
    }

    /// Full send path: restrictions, request counting, then issuance.
    #[instrument(skip(self))]
    pub async fn request_otp(
        &self,
        email: &str,
        display_name: &str,
        template: TemplateKey,
    ) -> Result<(), GateError> {
        if let Err(e) = self.check_restrictions(email).await {
            if e.is_client_error() {
                warn!("OTP request rejected: {}", e);
            }
            return Err(e);
        }
        self.track_request(email).await?;
        self.issue_otp(email, display_name, template).await
    }

    /// Generates and mails a new code. The code and the cooldown are only
    /// stored once the mail went out.
    #[instrument(skip(self))]
    pub async fn issue_otp(
        &self,
        email: &str,
        display_name: &str,
        template: TemplateKey,
    ) -> Result<(), GateError> {
        let otp = self.generate_otp();

        if !self
            .mailer
            .send_otp(email, display_name, template, &otp)
            .await
        {
            return Err(GateError::DeliveryFailed);
        }

        self.storage
            .set(
                &OtpKey::Otp.for_email(email),
                &otp,
                self.config.otp_expiry_seconds,
            )
            .await?;
        self.storage
            .set(
                &OtpKey::Cooldown.for_email(email),
                LOCK_SENTINEL,
                self.config.otp_cooldown_seconds,
            )
            .await?;

        info!(template = template.as_str(), "OTP issued");
        Ok(())
    }

    /// Compares the code and records a failure in one storage step, so a
    /// request that raced a lock cannot add a failure after the code is gone.
    #[instrument(skip(self, otp))]
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<(), GateError> {
        let max_attempts = self.config.otp_max_verify_attempts;
        let check = self
            .storage
            .check_otp(
                &OtpKey::Otp.for_email(email),
                &OtpKey::Attempts.for_email(email),
                otp,
                max_attempts.saturating_sub(1),
                self.config.otp_expiry_seconds,
            )
            .await?;

        match check {
            OtpCheck::Missing => Err(GateError::OtpExpiredOrMissing),
            OtpCheck::Matched => {
                info!("OTP verified");
                Ok(())
            }
            OtpCheck::Failed(failures) => Err(GateError::InvalidOtp {
                remaining_attempts: max_attempts.saturating_sub(failures),
            }),
            OtpCheck::Exhausted => {
                warn!("Too many failed OTP attempts, locking account");
                self.storage
                    .set(
                        &OtpKey::Lock.for_email(email),
                        LOCK_SENTINEL,
                        self.config.lock_seconds,
                    )
                    .await?;
                Err(GateError::AccountLocked {
                    retry_after_secs: self.config.lock_seconds,
                })
            }
        }
    }

    pub async fn state(&self, email: &str) -> Result<OtpState, GateError> {
        let restriction = self.restrictions.restriction(email).await?;

        let phase = match self.storage.ttl(&OtpKey::Lock.for_email(email)).await? {
            Some(retry_after_secs) => OtpPhase::Locked { retry_after_secs },
            None => match self.storage.ttl(&OtpKey::Otp.for_email(email)).await? {
                Some(expires_in_secs) => OtpPhase::Pending { expires_in_secs },
                None => OtpPhase::Idle,
            },
        };

        Ok(OtpState {
            phase,
            failed_attempts: self.read_counter(&OtpKey::Attempts.for_email(email)).await?,
            requests_in_window: self
                .read_counter(&OtpKey::RequestCount.for_email(email))
                .await?,
            restriction,
        })
    }

    async fn read_counter(&self, key: &str) -> Result<u32, GateError> {
        match self.storage.get(key).await? {
            Some(value) => value
                .parse()
                .map_err(|_| GateError::StorageError(format!("Value at {} is not a counter", key))),
            None => Ok(0),
        }
    }

    fn generate_otp(&self) -> String {
        let mut rng = rand::thread_rng();
        rng.gen_range(self.config.otp_range()).to_string()
    }
}
