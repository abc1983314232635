/// Key namespaces of the OTP gate. Every entry lives under
/// `{prefix}:{email}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpKey {
    Otp,
    Cooldown,
    RequestCount,
    SpamLock,
    Attempts,
    Lock,
}

impl OtpKey {
    pub fn prefix(self) -> &'static str {
        match self {
            OtpKey::Otp => "otp",
            OtpKey::Cooldown => "otp_cooldown",
            OtpKey::RequestCount => "otp_request_count",
            OtpKey::SpamLock => "otp_spam_lock",
            OtpKey::Attempts => "otp_attempts",
            OtpKey::Lock => "otp_lock",
        }
    }

    pub fn for_email(self, email: &str) -> String {
        format!("{}:{}", self.prefix(), email)
    }
}

/// Value stored under lock and cooldown keys. Only presence matters.
pub const LOCK_SENTINEL: &str = "locked";
