//! Session negotiation lifecycle

mod negotiation;

pub use negotiation::NegotiationSession;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Directionality of a media session, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaMode {
    /// Receive remote media only
    RecvOnly,
    /// Send local media only
    SendOnly,
    /// Send and receive
    SendRecv,
}

impl MediaMode {
    /// Whether the mode needs local media before negotiation can start
    pub fn requires_outbound_media(&self) -> bool {
        !matches!(self, MediaMode::RecvOnly)
    }

    /// Mode actually requested in the offer. Send-only is upgraded to
    /// send-receive; engines reject strict send-only offer constraints
    /// (crbug.com/443558).
    pub(crate) fn effective_offer_mode(&self) -> MediaMode {
        match self {
            MediaMode::SendOnly => MediaMode::SendRecv,
            other => *other,
        }
    }

    /// Per-mode configuration defaults, merged above the built-in
    /// defaults and below caller overrides
    pub(crate) fn configuration_defaults(&self) -> Value {
        json!({})
    }
}

impl std::fmt::Display for MediaMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaMode::RecvOnly => write!(f, "recvonly"),
            MediaMode::SendOnly => write!(f, "sendonly"),
            MediaMode::SendRecv => write!(f, "sendrecv"),
        }
    }
}

/// Negotiation lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, no negotiation attempted
    New,
    /// Waiting for local media acquisition
    AcquiringMedia,
    /// Offer created, not yet applied locally
    OfferCreated,
    /// Offer applied as local description
    LocalDescriptionSet,
    /// Offer emitted, waiting for the remote answer
    AwaitingAnswer,
    /// Remote answer applied; negotiation complete
    AnswerApplied,
    /// The last negotiation attempt failed
    Failed,
    /// Session disposed, handle closed
    Closed,
}

/// Offer payload handed to the signaling collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdpOffer {
    /// Offer SDP text
    pub sdp: String,
}

impl SdpOffer {
    /// Offer SDP text
    pub fn as_str(&self) -> &str {
        &self.sdp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_media_requirement() {
        assert!(!MediaMode::RecvOnly.requires_outbound_media());
        assert!(MediaMode::SendOnly.requires_outbound_media());
        assert!(MediaMode::SendRecv.requires_outbound_media());
    }

    #[test]
    fn test_send_only_effective_mode_is_send_recv() {
        assert_eq!(
            MediaMode::SendOnly.effective_offer_mode(),
            MediaMode::SendRecv
        );
        assert_eq!(
            MediaMode::RecvOnly.effective_offer_mode(),
            MediaMode::RecvOnly
        );
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(MediaMode::RecvOnly.to_string(), "recvonly");
        assert_eq!(MediaMode::SendRecv.to_string(), "sendrecv");
    }
}
