//! Descriptors for remote pipeline elements
//!
//! Every object the media server can host is described client-side by a
//! descriptor carrying the remote type name and the constructor
//! parameters serialized for the `create` call. The descriptors hold no
//! connection state; see the transport crates for the handles that bind
//! them to a live pipeline.

pub mod events;
pub mod filters;

pub use events::{CodeFound, FilterEvent, PlateDetected};
pub use filters::{FaceOverlayFilter, GStreamerFilter, PlateDetectorFilter, ZBarFilter};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A remote pipeline object the media server knows how to construct
pub trait ElementDescriptor {
    /// Remote type name, e.g. `"MediaPipeline"` or `"ZBarFilter"`
    fn type_name(&self) -> &'static str;

    /// Constructor parameters serialized for the `create` call
    fn constructor_params(&self) -> Value {
        json!({})
    }
}

/// Top-level container every other element is created inside
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaPipeline;

impl ElementDescriptor for MediaPipeline {
    fn type_name(&self) -> &'static str {
        "MediaPipeline"
    }
}

/// Endpoint terminating a WebRTC media session on the server side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebRtcEndpoint;

impl ElementDescriptor for WebRtcEndpoint {
    fn type_name(&self) -> &'static str {
        "WebRtcEndpoint"
    }
}

/// Endpoint injecting media read from a URI into the pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEndpoint {
    /// Source URI (http(s), file, rtsp)
    pub uri: String,
}

impl PlayerEndpoint {
    /// Create a player for the given source URI
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

impl ElementDescriptor for PlayerEndpoint {
    fn type_name(&self) -> &'static str {
        "PlayerEndpoint"
    }

    fn constructor_params(&self) -> Value {
        json!({ "uri": self.uri })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_and_endpoint_type_names() {
        assert_eq!(MediaPipeline.type_name(), "MediaPipeline");
        assert_eq!(WebRtcEndpoint.type_name(), "WebRtcEndpoint");
        assert_eq!(MediaPipeline.constructor_params(), json!({}));
    }

    #[test]
    fn test_player_endpoint_params() {
        let player = PlayerEndpoint::new("http://media.example.com/barcodes.webm");
        assert_eq!(player.type_name(), "PlayerEndpoint");
        assert_eq!(
            player.constructor_params(),
            json!({ "uri": "http://media.example.com/barcodes.webm" })
        );
    }
}
