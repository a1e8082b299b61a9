//! Centralized error types for KcMapper.

use thiserror::Error;

/// Main error type for configuration and setup.
#[derive(Error, Debug)]
pub enum KcmError {
    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    #[error("Invalid setting '{name}': {reason}")]
    InvalidSetting { name: String, reason: String },
}

/// Result type for KcMapper core operations.
pub type KcmResult<T> = Result<T, KcmError>;

impl KcmError {
    /// Create a missing setting error.
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingSetting(name.into())
    }

    /// Create an invalid setting error.
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
