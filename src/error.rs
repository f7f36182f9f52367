//! Error types
//!
//! The simulation itself is total; the only failures are startup-time
//! configuration problems.

use thiserror::Error;

/// Errors raised while loading or validating a [`GameConfig`](crate::GameConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A tuning value makes the game unplayable (e.g. a gap that cannot be placed).
    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfiguration {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The config file is not valid JSON for `GameConfig`.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The config file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
