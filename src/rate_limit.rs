use crate::config::OtpConfig;
use crate::errors::GateError;
use crate::keys::{OtpKey, LOCK_SENTINEL};
use crate::storage::Storage;
use std::sync::Arc;
use tracing::warn;

pub struct RequestTracker {
    storage: Arc<dyn Storage>,
    config: OtpConfig,
}

impl RequestTracker {
    pub fn new(storage: Arc<dyn Storage>, config: OtpConfig) -> Self {
        Self { storage, config }
    }

    /// Counts an OTP send request. The request that would exceed the
    /// per-window allowance sets the spam lock and is itself rejected.
    pub async fn track_request(&self, email: &str) -> Result<(), GateError> {
        let key = OtpKey::RequestCount.for_email(email);
        let count = self
            .storage
            .increment_capped(
                &key,
                self.config.otp_requests_per_window,
                self.config.request_window_seconds,
            )
            .await?;

        if count.is_none() {
            warn!(email, "OTP request threshold exceeded, setting spam lock");
            self.storage
                .set(
                    &OtpKey::SpamLock.for_email(email),
                    LOCK_SENTINEL,
                    self.config.spam_lock_seconds,
                )
                .await?;
            return Err(GateError::RequestThrottled {
                retry_after_secs: self.config.spam_lock_seconds,
            });
        }
        Ok(())
    }
}
