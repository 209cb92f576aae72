//! WebRTC session negotiation and media-server signaling for PipeLink
//!
//! The centerpiece is [`NegotiationSession`]: a wrapper owning one
//! `webrtc` peer connection that sequences the offer/answer exchange
//! and manages the local media-track lifecycle (acquisition, enabling,
//! teardown). Alongside it, [`signaling::PipelineClient`] speaks the
//! media server's JSON-RPC 2.0 object API so a negotiated session can
//! be wired into a remote processing pipeline.
//!
//! SDP payloads and ICE candidate descriptors are opaque here; carrying
//! them between peers is the caller's signaling channel's job.

pub mod config;
pub mod error;
pub mod events;
pub mod media;
pub mod peer;
pub mod session;
pub mod signaling;

pub use config::SessionOptions;
pub use error::{Error, Result};
pub use events::{CandidateDescriptor, ErrorCode, SessionEvent};
pub use media::{MediaAttachment, MediaLocator, RemoteAttachment};
pub use session::{MediaMode, NegotiationSession, SdpOffer, SessionState};
