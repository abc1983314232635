use crate::errors::GateError;
use crate::keys::OtpKey;
use crate::storage::Storage;
use serde::Serialize;
use std::sync::Arc;

/// An active block on sending OTPs, with the seconds until it lifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Restriction {
    Locked { retry_after_secs: u64 },
    SpamLocked { retry_after_secs: u64 },
    Cooldown { retry_after_secs: u64 },
}

impl From<Restriction> for GateError {
    fn from(restriction: Restriction) -> Self {
        match restriction {
            Restriction::Locked { retry_after_secs } => GateError::AccountLocked { retry_after_secs },
            Restriction::SpamLocked { retry_after_secs } => {
                GateError::RequestThrottled { retry_after_secs }
            }
            Restriction::Cooldown { retry_after_secs } => {
                GateError::CooldownActive { retry_after_secs }
            }
        }
    }
}

pub struct RestrictionChecker {
    storage: Arc<dyn Storage>,
}

impl RestrictionChecker {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Returns the highest-priority active restriction. Hard lock wins over
    /// spam lock, spam lock over cooldown. Never writes.
    pub async fn restriction(&self, email: &str) -> Result<Option<Restriction>, GateError> {
        if let Some(secs) = self.storage.ttl(&OtpKey::Lock.for_email(email)).await? {
            return Ok(Some(Restriction::Locked {
                retry_after_secs: secs,
            }));
        }
        if let Some(secs) = self.storage.ttl(&OtpKey::SpamLock.for_email(email)).await? {
            return Ok(Some(Restriction::SpamLocked {
                retry_after_secs: secs,
            }));
        }
        if let Some(secs) = self.storage.ttl(&OtpKey::Cooldown.for_email(email)).await? {
            return Ok(Some(Restriction::Cooldown {
                retry_after_secs: secs,
            }));
        }
        Ok(None)
    }

    pub async fn check_restrictions(&self, email: &str) -> Result<(), GateError> {
        match self.restriction(email).await? {
            Some(restriction) => Err(restriction.into()),
            None => Ok(()),
        }
    }
}
