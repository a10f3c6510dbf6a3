//! Error types for tamework-config

use thiserror::Error;

/// Config loading error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid config document {source_label}: {reason}")]
    InvalidDocument { source_label: String, reason: String },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
