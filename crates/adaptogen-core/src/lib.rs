//! Shared types for adaptogen: command fingerprints, key normalization,
//! execution results, and environment configuration.

pub mod app_config;
pub mod config;
pub mod fingerprint;
pub mod keys;
pub mod result;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use fingerprint::{fingerprint, Fingerprint};
pub use keys::normalize_keys;
pub use result::{completion_time, ExecutionResult};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
