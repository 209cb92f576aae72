//! Session configuration: option bundle and constraint construction
//!
//! The ICE/transport configuration a session runs with is merged from
//! three layers, caller overrides winning on collision:
//! built-in defaults < session-mode defaults < caller overrides.
//! Offer constraints follow the same scheme on top of the flags derived
//! from the session mode.

use crate::events::SessionEvent;
use crate::media::{CaptureSource, MediaAttachment, MediaCapture, MediaSink};
use crate::session::MediaMode;
use pipelink_core::config::{layered, recursive};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::RTCPeerConnection;

/// Default constraints applied beneath the caller's media constraints
/// when acquiring local media
pub fn default_media_constraints() -> Value {
    json!({
        "audio": true,
        "video": {
            "mandatory": {
                "maxWidth": 640,
                "maxFrameRate": 15,
                "minFrameRate": 15
            }
        }
    })
}

/// Recognized options for constructing a negotiation session
#[derive(Default)]
pub struct SessionOptions {
    /// Sink shown the muted local preview
    pub local_sink: Option<Arc<dyn MediaSink>>,
    /// Sink handed the remote stream locator
    pub remote_sink: Option<Arc<dyn MediaSink>>,
    /// ICE/transport configuration overrides
    pub configuration: Option<Value>,
    /// Media constraints for local acquisition
    pub media_constraints: Option<Value>,
    /// Offer (connection) constraints
    pub connection_constraints: Option<Value>,
    /// Pre-existing peer handle to negotiate over
    pub peer: Option<Arc<RTCPeerConnection>>,
    /// Capture provider for local media
    pub capture: Option<Arc<dyn MediaCapture>>,
    /// Local media source selector
    pub capture_source: CaptureSource,
    /// Pre-acquired primary (video) attachment
    pub video_attachment: Option<MediaAttachment>,
    /// Pre-acquired secondary (audio) attachment
    pub audio_attachment: Option<MediaAttachment>,
    /// Channel the session emits its events on
    pub events: Option<mpsc::Sender<SessionEvent>>,
}

impl SessionOptions {
    /// Empty option bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the local preview sink
    pub fn with_local_sink(mut self, sink: Arc<dyn MediaSink>) -> Self {
        self.local_sink = Some(sink);
        self
    }

    /// Set the remote stream sink
    pub fn with_remote_sink(mut self, sink: Arc<dyn MediaSink>) -> Self {
        self.remote_sink = Some(sink);
        self
    }

    /// Set ICE/transport configuration overrides
    pub fn with_configuration(mut self, configuration: Value) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Set media constraints for local acquisition
    pub fn with_media_constraints(mut self, constraints: Value) -> Self {
        self.media_constraints = Some(constraints);
        self
    }

    /// Set offer constraints
    pub fn with_connection_constraints(mut self, constraints: Value) -> Self {
        self.connection_constraints = Some(constraints);
        self
    }

    /// Negotiate over an externally supplied peer handle
    pub fn with_peer(mut self, peer: Arc<RTCPeerConnection>) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Set the capture provider
    pub fn with_capture(mut self, capture: Arc<dyn MediaCapture>) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Select the local media source
    pub fn with_capture_source(mut self, source: CaptureSource) -> Self {
        self.capture_source = source;
        self
    }

    /// Supply a pre-acquired primary attachment
    pub fn with_video_attachment(mut self, attachment: MediaAttachment) -> Self {
        self.video_attachment = Some(attachment);
        self
    }

    /// Supply a pre-acquired secondary attachment
    pub fn with_audio_attachment(mut self, attachment: MediaAttachment) -> Self {
        self.audio_attachment = Some(attachment);
        self
    }

    /// Set the session event channel
    pub fn with_events(mut self, events: mpsc::Sender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }
}

/// Merge the ICE/transport configuration layers for a session
pub(crate) fn merged_rtc_configuration(mode: MediaMode, overrides: Option<&Value>) -> Value {
    let defaults = pipelink_core::config::default_ice_configuration();
    let mode_defaults = mode.configuration_defaults();
    let overrides = overrides.cloned().unwrap_or(Value::Null);
    layered([&defaults, &mode_defaults, &overrides])
}

/// Build the offer constraints for a session mode.
///
/// The receive flags derive from the effective mode; `extra` layers the
/// session's connection constraints and the per-call constraints on
/// top, in order. The `DtlsSrtpKeyAgreement` entry is implicit in the
/// engine and participates in the merge only.
pub(crate) fn offer_constraints(mode: MediaMode, extra: &[&Value]) -> Value {
    let effective = mode.effective_offer_mode();
    let receive = effective != MediaMode::SendOnly;

    let mut constraints = json!({
        "mandatory": {
            "OfferToReceiveAudio": receive,
            "OfferToReceiveVideo": receive,
        },
        "optional": [
            { "DtlsSrtpKeyAgreement": true }
        ]
    });

    for layer in extra {
        constraints = recursive(&constraints, layer);
    }

    constraints
}

/// Read the receive flags back out of a merged constraint map
pub(crate) fn receive_flags(constraints: &Value) -> (bool, bool) {
    let mandatory = &constraints["mandatory"];
    (
        mandatory["OfferToReceiveAudio"].as_bool().unwrap_or(true),
        mandatory["OfferToReceiveVideo"].as_bool().unwrap_or(true),
    )
}

/// Parse the `iceServers` list of a merged configuration into engine
/// server entries. Entries without URLs are skipped.
pub(crate) fn ice_servers_from_configuration(configuration: &Value) -> Vec<RTCIceServer> {
    let Some(servers) = configuration["iceServers"].as_array() else {
        return Vec::new();
    };

    servers
        .iter()
        .filter_map(|server| {
            let urls: Vec<String> = match &server["urls"] {
                Value::String(url) => vec![url.clone()],
                Value::Array(list) => list
                    .iter()
                    .filter_map(|u| u.as_str().map(str::to_string))
                    .collect(),
                // Single-URL spelling some callers use
                _ => server["url"].as_str().map(str::to_string).into_iter().collect(),
            };
            if urls.is_empty() {
                return None;
            }
            Some(RTCIceServer {
                urls,
                username: server["username"].as_str().unwrap_or_default().to_string(),
                credential: server["credential"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                ..Default::default()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_merge_override_wins() {
        let overrides = json!({ "iceServers": [{ "urls": ["stun:b.example.com"] }], "extra": 1 });
        let merged = merged_rtc_configuration(MediaMode::SendRecv, Some(&overrides));

        assert_eq!(
            merged["iceServers"][0]["urls"][0],
            json!("stun:b.example.com")
        );
        assert_eq!(merged["extra"], json!(1));
    }

    #[test]
    fn test_configuration_defaults_retained_without_overrides() {
        let merged = merged_rtc_configuration(MediaMode::RecvOnly, None);
        assert!(merged["iceServers"][0]["urls"][0]
            .as_str()
            .unwrap()
            .starts_with("stun:"));
    }

    #[test]
    fn test_offer_constraints_receive_both_by_default() {
        for mode in [MediaMode::RecvOnly, MediaMode::SendRecv] {
            let constraints = offer_constraints(mode, &[]);
            assert_eq!(receive_flags(&constraints), (true, true), "{:?}", mode);
        }
    }

    #[test]
    fn test_send_only_upgraded_to_send_receive() {
        // The engine rejects send-only offers; the session requests
        // full send-receive capability instead.
        let constraints = offer_constraints(MediaMode::SendOnly, &[]);
        assert_eq!(receive_flags(&constraints), (true, true));
    }

    #[test]
    fn test_caller_constraints_override_derived_flags() {
        let extra = json!({ "mandatory": { "OfferToReceiveVideo": false } });
        let constraints = offer_constraints(MediaMode::SendRecv, &[&extra]);
        assert_eq!(receive_flags(&constraints), (true, false));
    }

    #[test]
    fn test_offer_constraints_carry_dtls_srtp() {
        let constraints = offer_constraints(MediaMode::RecvOnly, &[]);
        assert_eq!(
            constraints["optional"][0]["DtlsSrtpKeyAgreement"],
            json!(true)
        );
    }

    #[test]
    fn test_ice_servers_parse_url_forms() {
        let configuration = json!({
            "iceServers": [
                { "urls": ["stun:stun.example.com"] },
                { "url": "turn:turn.example.com", "username": "u", "credential": "c" },
                { "comment": "no urls, skipped" }
            ]
        });

        let servers = ice_servers_from_configuration(&configuration);
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].urls, vec!["stun:stun.example.com".to_string()]);
        assert_eq!(servers[1].username, "u");
        assert_eq!(servers[1].credential, "c");
    }

    #[test]
    fn test_empty_ice_servers_override() {
        let merged =
            merged_rtc_configuration(MediaMode::RecvOnly, Some(&json!({ "iceServers": [] })));
        assert!(ice_servers_from_configuration(&merged).is_empty());
    }

    #[test]
    fn test_default_media_constraints_shape() {
        let constraints = default_media_constraints();
        assert_eq!(constraints["audio"], json!(true));
        assert_eq!(constraints["video"]["mandatory"]["maxWidth"], json!(640));
    }
}
