//! Error types for PipeLink WebRTC sessions

use crate::events::ErrorCode;

/// Result type alias using the WebRTC session Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in session negotiation and pipeline signaling
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Local media acquisition failed (camera/screen denied or unavailable)
    #[error("Media acquisition failed: {0}")]
    MediaAcquisition(String),

    /// Offer creation or local-description application rejected
    #[error("Negotiation failed: {0}")]
    Negotiation(String),

    /// Remote description malformed or incompatible
    #[error("Remote description rejected: {0}")]
    RemoteDescription(String),

    /// Operation attempted after the peer handle was closed
    #[error("Peer connection is closed")]
    ConnectionClosed,

    /// ICE candidate could not be applied
    #[error("ICE candidate error: {0}")]
    Candidate(String),

    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Signaling connection error
    #[error("Signaling error: {0}")]
    Signaling(String),

    /// Media server rejected a pipeline request
    #[error("Pipeline protocol error {code}: {message}")]
    Protocol {
        /// JSON-RPC error code
        code: i64,
        /// Human-readable error message
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error from the PipeLink core crate
    #[error("Core error: {0}")]
    Core(#[from] pipelink_core::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Check whether this is the closed-handle condition
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::ConnectionClosed)
    }

    /// Event error code for this error class
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::MediaAcquisition(_) => ErrorCode::MediaAcquisition,
            Error::Negotiation(_) => ErrorCode::Negotiation,
            Error::RemoteDescription(_) => ErrorCode::RemoteDescription,
            Error::ConnectionClosed => ErrorCode::ConnectionClosed,
            Error::Candidate(_) => ErrorCode::Candidate,
            Error::Signaling(_) | Error::Protocol { .. } => ErrorCode::Signaling,
            _ => ErrorCode::Internal,
        }
    }
}
