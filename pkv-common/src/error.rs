//! Common error types for PKV

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for PKV operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across PKV crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error outside of dataset loading
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Dataset file could not be read or parsed
    #[error("Dataset error in {path}: {message}")]
    Dataset { path: PathBuf, message: String },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn dataset(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::Dataset {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
