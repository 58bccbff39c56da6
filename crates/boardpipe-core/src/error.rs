//! Error types for boardpipe-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in boardpipe-core
#[derive(Debug, Error)]
pub enum Error {
    /// Item payload did not match the expected shape
    #[error("Invalid item payload: {0}")]
    InvalidItem(String),

    /// Column payload did not match the expected shape
    #[error("Invalid column payload: {0}")]
    InvalidColumn(String),

    /// Underlying JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
