//! Error types for the pushtrain pipeline
//!
//! This module provides structured error definitions using thiserror, with
//! anyhow available for error propagation at the edges.

use thiserror::Error;

/// Main error type for pushtrain operations
#[derive(Error, Debug)]
pub enum PushtrainError {
    /// A required remote fetch failed (transport error or non-2xx status)
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// A remote response did not have the expected JSON shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Invalid pipeline configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for pushtrain operations
pub type Result<T> = std::result::Result<T, PushtrainError>;

/// Convert anyhow::Error to PushtrainError
impl From<anyhow::Error> for PushtrainError {
    fn from(err: anyhow::Error) -> Self {
        PushtrainError::Other(err.to_string())
    }
}
