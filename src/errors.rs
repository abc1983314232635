use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("Please wait {retry_after_secs} seconds before requesting a new OTP")]
    CooldownActive { retry_after_secs: u64 },

    #[error("Too many OTP requests, please wait {retry_after_secs} seconds before requesting again")]
    RequestThrottled { retry_after_secs: u64 },

    #[error("Account is locked due to multiple failed attempts, try again in {retry_after_secs} seconds")]
    AccountLocked { retry_after_secs: u64 },

    #[error("Invalid or expired OTP")]
    OtpExpiredOrMissing,

    #[error("Incorrect OTP, {remaining_attempts} attempts left")]
    InvalidOtp { remaining_attempts: u32 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Email error: {0}")]
    EmailError(String),

    #[error("OTP could not be delivered")]
    DeliveryFailed,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl GateError {
    /// True for failures caused by the caller's input or state, false for
    /// infrastructure faults.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GateError::CooldownActive { .. }
                | GateError::RequestThrottled { .. }
                | GateError::AccountLocked { .. }
                | GateError::OtpExpiredOrMissing
                | GateError::InvalidOtp { .. }
                | GateError::Validation(_)
        )
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            GateError::CooldownActive { retry_after_secs }
            | GateError::RequestThrottled { retry_after_secs }
            | GateError::AccountLocked { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}
