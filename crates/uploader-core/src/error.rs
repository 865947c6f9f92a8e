//! Error types for the uploader pipeline

use thiserror::Error;

/// Result type alias using the uploader Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the uploader pipeline
#[derive(Error, Debug)]
pub enum Error {
    // Remote resource errors
    #[error("Experiment not found: {experiment}")]
    ExperimentNotFound { experiment: String },

    #[error("RPC error during {operation}: {message}")]
    Rpc { operation: String, message: String },

    // Event file errors
    #[error("Corrupt record in {path} at offset {offset}: {reason}")]
    CorruptRecord {
        path: String,
        offset: u64,
        reason: String,
    },

    // Storage errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Storage path not found: {path}")]
    StoragePathNotFound { path: String },

    // Configuration errors
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Returns true if this error should terminate the upload loop
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ExperimentNotFound { .. }
                | Error::InvalidConfig { .. }
                | Error::Internal { .. }
        )
    }

    /// Returns true if the next poll may succeed where this one failed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Rpc { .. } | Error::Storage { .. } | Error::Io(_)
        )
    }
}
