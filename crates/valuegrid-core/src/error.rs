//! Error types for index validation and configuration loading.

use thiserror::Error;

/// Why a submitted index was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("index too high: {value} exceeds {max}")]
    TooHigh { value: i32, max: i32 },

    #[error("index is not an integer: {0}")]
    NotAnInteger(String),
}

/// Errors raised while loading or validating a [`crate::ServiceConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
