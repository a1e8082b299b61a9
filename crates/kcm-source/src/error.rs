//! Source extraction errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Request to {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Admin API returned {status} for {path}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid server URL: {0}")]
    Url(String),

    #[error("Unexpected payload from {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for source calls.
pub type SourceResult<T> = Result<T, SourceError>;
