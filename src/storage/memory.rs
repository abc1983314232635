use crate::errors::GateError;
use crate::storage::{OtpCheck, Storage};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::time::{Duration, Instant};

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

pub struct InMemoryStorage {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn poisoned<T>(_: T) -> GateError {
        GateError::StorageError("Lock poisoned".into())
    }

    fn live_counter(
        map: &HashMap<String, Entry>,
        key: &str,
        now: Instant,
    ) -> Result<u32, GateError> {
        match map.get(key).filter(|entry| entry.is_live(now)) {
            Some(entry) => entry.value.parse::<u32>().map_err(|_| {
                GateError::StorageError(format!("Value at {} is not a counter", key))
            }),
            None => Ok(0),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, GateError> {
        let map = self.entries.read().map_err(Self::poisoned)?;
        let now = Instant::now();
        Ok(map
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), GateError> {
        let mut map = self.entries.write().map_err(Self::poisoned)?;
        map.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, GateError> {
        let map = self.entries.read().map_err(Self::poisoned)?;
        let now = Instant::now();
        Ok(map.get(key).filter(|entry| entry.is_live(now)).map(|entry| {
            let remaining = entry.expires_at - now;
            remaining.as_millis().div_ceil(1000) as u64
        }))
    }

    async fn delete(&self, keys: &[String]) -> Result<(), GateError> {
        let mut map = self.entries.write().map_err(Self::poisoned)?;
        for key in keys {
            map.remove(key);
        }
        Ok(())
    }

    async fn increment_capped(
        &self,
        key: &str,
        cap: u32,
        ttl_seconds: u64,
    ) -> Result<Option<u32>, GateError> {
        let mut map = self.entries.write().map_err(Self::poisoned)?;
        let now = Instant::now();

        let current = Self::live_counter(&map, key, now)?;
        if current >= cap {
            return Ok(None);
        }

        let next = current + 1;
        map.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at: now + Duration::from_secs(ttl_seconds),
            },
        );
        Ok(Some(next))
    }

    async fn check_otp(
        &self,
        otp_key: &str,
        attempts_key: &str,
        code: &str,
        cap: u32,
        ttl_seconds: u64,
    ) -> Result<OtpCheck, GateError> {
        let mut map = self.entries.write().map_err(Self::poisoned)?;
        let now = Instant::now();

        let matched = match map.get(otp_key).filter(|entry| entry.is_live(now)) {
            Some(entry) => entry.value == code,
            None => return Ok(OtpCheck::Missing),
        };
        if matched {
            map.remove(otp_key);
            map.remove(attempts_key);
            return Ok(OtpCheck::Matched);
        }

        let current = Self::live_counter(&map, attempts_key, now)?;
        if current >= cap {
            map.remove(otp_key);
            map.remove(attempts_key);
            return Ok(OtpCheck::Exhausted);
        }

        let next = current + 1;
        map.insert(
            attempts_key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at: now + Duration::from_secs(ttl_seconds),
            },
        );
        Ok(OtpCheck::Failed(next))
    }

    async fn purge_expired(&self) -> Result<usize, GateError> {
        let mut map = self.entries.write().map_err(Self::poisoned)?;
        let now = Instant::now();
        let before = map.len();
        map.retain(|_, entry| entry.is_live(now));
        Ok(before - map.len())
    }
}
