//! Error types for devsensor-core

use thiserror::Error;

/// Main error type for the devsensor-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Collector/API error
    #[error("collector error: {0}")]
    Collector(String),
}

/// Result type alias for devsensor-core
pub type Result<T> = std::result::Result<T, Error>;
