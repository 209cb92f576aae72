//! Error types for PipeLink core

use thiserror::Error;

/// Result type alias for PipeLink core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in PipeLink core operations
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline element descriptor error
    #[error("Element error: {0}")]
    Element(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}
