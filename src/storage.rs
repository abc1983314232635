use crate::config::{OtpConfig, StorageType};
use crate::errors::GateError;
use async_trait::async_trait;
use std::sync::Arc;

pub mod memory;

/// Outcome of comparing a supplied code against the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    /// No live code.
    Missing,
    /// Code matched; code and attempt counter were deleted.
    Matched,
    /// Mismatch, recorded. Holds the failure count after this attempt.
    Failed(u32),
    /// Mismatch with the counter already at the cap; code and counter were
    /// deleted.
    Exhausted,
}

/// Key-value store with per-key expiry. An expired key behaves exactly like
/// one that was never written.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, GateError>;
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), GateError>;

    /// Remaining lifetime in whole seconds, rounded up. `None` if absent.
    async fn ttl(&self, key: &str) -> Result<Option<u64>, GateError>;

    async fn delete(&self, keys: &[String]) -> Result<(), GateError>;

    /// Atomically increments the counter at `key` unless it already holds
    /// `cap` or more, in which case it is left untouched and `None` is
    /// returned. A successful increment restarts the key's TTL.
    async fn increment_capped(
        &self,
        key: &str,
        cap: u32,
        ttl_seconds: u64,
    ) -> Result<Option<u32>, GateError>;

    /// Compares `code` with the value at `otp_key` and updates the attempt
    /// counter at `attempts_key` in one atomic step. `cap` and `ttl_seconds`
    /// apply to the counter as in `increment_capped`.
    async fn check_otp(
        &self,
        otp_key: &str,
        attempts_key: &str,
        code: &str,
        cap: u32,
        ttl_seconds: u64,
    ) -> Result<OtpCheck, GateError>;

    /// Drops expired entries and returns how many were removed.
    async fn purge_expired(&self) -> Result<usize, GateError>;
}

pub mod redis;
pub use self::memory::InMemoryStorage;
pub use self::redis::RedisStorage;

pub fn build_storage(config: &OtpConfig) -> Result<Arc<dyn Storage>, GateError> {
    match config.storage_type {
        StorageType::Memory => Ok(Arc::new(InMemoryStorage::new())),
        StorageType::Redis => Ok(Arc::new(RedisStorage::new(&config.redis_url)?)),
    }
}
