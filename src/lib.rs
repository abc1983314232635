#![doc = include_str!("../README.md")]

#[cfg(feature = "axum")]
pub mod axum_api;
pub mod config;
pub mod cron;
pub mod email;
pub mod errors;
pub mod keys;
pub mod rate_limit;
pub mod restrictions;
pub mod service;
pub mod state;
pub mod storage;
pub mod validation;

pub use config::{OtpConfig, StorageType};
pub use cron::CleanupService;
pub use email::{EmailSender, LettreEmailSender, TemplateKey};
pub use errors::GateError;
pub use restrictions::Restriction;
pub use service::OtpService;
pub use state::{OtpPhase, OtpState};
pub use storage::{build_storage, InMemoryStorage, OtpCheck, RedisStorage, Storage};
