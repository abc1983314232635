use crate::restrictions::Restriction;
use serde::Serialize;

/// Where an identifier stands in the OTP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum OtpPhase {
    /// No code outstanding, either never issued, verified, or expired.
    Idle,
    Pending { expires_in_secs: u64 },
    /// Too many failed verifications; sending is blocked until the lock expires.
    Locked { retry_after_secs: u64 },
}

/// Snapshot of everything the gate stores for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpState {
    pub phase: OtpPhase,
    pub failed_attempts: u32,
    pub requests_in_window: u32,
    pub restriction: Option<Restriction>,
}

impl OtpState {
    pub fn can_request(&self) -> bool {
        self.restriction.is_none()
    }
}
