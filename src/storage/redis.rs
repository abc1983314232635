use crate::errors::GateError;
use crate::storage::{OtpCheck, Storage};
use async_trait::async_trait;
use redis::{AsyncCommands, Script};

// KEYS[1] counter, ARGV[1] cap, ARGV[2] ttl seconds. Returns -1 when capped.
const INCREMENT_CAPPED: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
if current >= tonumber(ARGV[1]) then
    return -1
end
current = redis.call('INCR', KEYS[1])
redis.call('EXPIRE', KEYS[1], ARGV[2])
return current
"#;

// KEYS[1] otp, KEYS[2] attempts, ARGV[1] code, ARGV[2] cap, ARGV[3] ttl.
// -1 missing, 0 matched, -2 exhausted, n > 0 failures so far.
const CHECK_OTP: &str = r#"
local stored = redis.call('GET', KEYS[1])
if not stored then
    return -1
end
if stored == ARGV[1] then
    redis.call('DEL', KEYS[1], KEYS[2])
    return 0
end
local current = tonumber(redis.call('GET', KEYS[2]) or '0')
if current >= tonumber(ARGV[2]) then
    redis.call('DEL', KEYS[1], KEYS[2])
    return -2
end
current = redis.call('INCR', KEYS[2])
redis.call('EXPIRE', KEYS[2], ARGV[3])
return current
"#;

pub struct RedisStorage {
    client: redis::Client,
    increment_script: Script,
    check_otp_script: Script,
}

impl RedisStorage {
    pub fn new(redis_url: &str) -> Result<Self, GateError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            increment_script: Script::new(INCREMENT_CAPPED),
            check_otp_script: Script::new(CHECK_OTP),
        })
    }
}

/// Maps a `TTL` reply. Every gate key is written with an expiry, so a key
/// without one is corrupt state rather than a lock that never lifts.
fn remaining_secs(key: &str, ttl: i64) -> Result<Option<u64>, GateError> {
    match ttl {
        -2 => Ok(None),
        -1 => Err(GateError::StorageError(format!("Key {} has no expiry", key))),
        secs if secs >= 0 => Ok(Some(secs as u64)),
        other => Err(GateError::StorageError(format!(
            "Unexpected TTL reply {} for {}",
            other, key
        ))),
    }
}

fn otp_check_from_reply(reply: i64) -> Result<OtpCheck, GateError> {
    match reply {
        -1 => Ok(OtpCheck::Missing),
        0 => Ok(OtpCheck::Matched),
        -2 => Ok(OtpCheck::Exhausted),
        n if n > 0 => u32::try_from(n)
            .map(OtpCheck::Failed)
            .map_err(|_| GateError::StorageError(format!("Attempt counter out of range: {}", n))),
        other => Err(GateError::StorageError(format!(
            "Unexpected OTP check reply {}",
            other
        ))),
    }
}

#[async_trait]
impl Storage for RedisStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, GateError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), GateError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, GateError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let ttl: i64 = conn.ttl(key).await?;
        remaining_secs(key, ttl)
    }

    async fn delete(&self, keys: &[String]) -> Result<(), GateError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(keys).await?;
        Ok(())
    }

    async fn increment_capped(
        &self,
        key: &str,
        cap: u32,
        ttl_seconds: u64,
    ) -> Result<Option<u32>, GateError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let count: i64 = self
            .increment_script
            .key(key)
            .arg(cap)
            .arg(ttl_seconds)
            .invoke_async(&mut conn)
            .await?;
        Ok(u32::try_from(count).ok())
    }

    async fn check_otp(
        &self,
        otp_key: &str,
        attempts_key: &str,
        code: &str,
        cap: u32,
        ttl_seconds: u64,
    ) -> Result<OtpCheck, GateError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let reply: i64 = self
            .check_otp_script
            .key(otp_key)
            .key(attempts_key)
            .arg(code)
            .arg(cap)
            .arg(ttl_seconds)
            .invoke_async(&mut conn)
            .await?;
        otp_check_from_reply(reply)
    }

    async fn purge_expired(&self) -> Result<usize, GateError> {
        // Redis evicts expired keys itself.
        Ok(0)
    }
}
