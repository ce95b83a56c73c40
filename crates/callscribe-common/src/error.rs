//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for callscribe operations
pub type Result<T> = std::result::Result<T, CallscribeError>;

/// Main error type for callscribe
#[derive(Error, Debug)]
pub enum CallscribeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
