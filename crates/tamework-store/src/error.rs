//! Error types for ownership persistence.

use thiserror::Error;

/// Errors that can occur while loading or saving the ownership file.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The file parsed but is not a JSON object.
    #[error("Invalid ownership document: expected an object, got {0}")]
    InvalidDocument(&'static str),
}

/// Result type for ownership persistence.
pub type Result<T> = std::result::Result<T, Error>;
