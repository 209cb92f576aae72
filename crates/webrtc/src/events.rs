//! Session event surface
//!
//! A session reports its lifecycle through a fixed set of event kinds,
//! each carrying a typed payload, delivered over an optional
//! `mpsc::Sender` supplied in the session options. There is no
//! string-keyed dispatch: a collaborator matches on the enum.

use crate::media::MediaLocator;
use serde::{Deserialize, Serialize};

/// Error classes carried by [`SessionEvent::Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Local media acquisition failed
    MediaAcquisition,
    /// Offer creation or local-description application failed
    Negotiation,
    /// Remote description rejected
    RemoteDescription,
    /// Operation on a closed peer handle
    ConnectionClosed,
    /// ICE candidate could not be applied
    Candidate,
    /// Signaling/pipeline protocol failure
    Signaling,
    /// Internal error
    Internal,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::MediaAcquisition => write!(f, "MEDIA_ACQUISITION"),
            ErrorCode::Negotiation => write!(f, "NEGOTIATION"),
            ErrorCode::RemoteDescription => write!(f, "REMOTE_DESCRIPTION"),
            ErrorCode::ConnectionClosed => write!(f, "CONNECTION_CLOSED"),
            ErrorCode::Candidate => write!(f, "CANDIDATE"),
            ErrorCode::Signaling => write!(f, "SIGNALING"),
            ErrorCode::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Network path descriptor discovered by the negotiation engine,
/// re-emitted for the caller's signaling channel to relay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDescriptor {
    /// Candidate line as produced by the engine
    pub candidate: String,
    /// Media stream identification tag
    pub sdp_mid: Option<String>,
    /// Index of the media description the candidate belongs to
    pub sdp_mline_index: Option<u16>,
}

/// Events emitted by a negotiation session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Local SDP offer is set and ready for the signaling channel
    OfferReady {
        /// Offer SDP text
        sdp: String,
    },
    /// A local ICE candidate was discovered
    IceCandidate(CandidateDescriptor),
    /// Candidate gathering finished for the current phase
    IceGatheringDone,
    /// Remote media was attached; the locator dereferences the stream
    RemoteMediaAvailable {
        /// Locator handed to the remote sink
        locator: MediaLocator,
    },
    /// A negotiation step failed
    Error {
        /// Error class
        code: ErrorCode,
        /// Human-readable message
        message: String,
    },
    /// Session resources were released; sinks may release theirs
    Disposed,
}

impl SessionEvent {
    /// Event name for logging
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::OfferReady { .. } => "offer_ready",
            SessionEvent::IceCandidate(_) => "ice_candidate",
            SessionEvent::IceGatheringDone => "ice_gathering_done",
            SessionEvent::RemoteMediaAvailable { .. } => "remote_media_available",
            SessionEvent::Error { .. } => "error",
            SessionEvent::Disposed => "disposed",
        }
    }
}
