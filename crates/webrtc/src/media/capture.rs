//! Local media acquisition
//!
//! Acquisition is a capability seam: the session asks a
//! [`MediaCapture`] provider for an attachment honoring the merged
//! media constraints, and stays agnostic of where the frames come from.
//! [`SyntheticCapture`] is the built-in provider; integrations backed
//! by real devices implement the trait themselves.

use super::{LocalMediaTrack, MediaAttachment, MediaKind};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Local media source selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    /// Camera plus microphone (the default)
    #[default]
    Camera,
    /// Screen capture
    Screen,
}

impl std::fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureSource::Camera => write!(f, "camera"),
            CaptureSource::Screen => write!(f, "screen"),
        }
    }
}

/// Capability to acquire local media
#[async_trait]
pub trait MediaCapture: Send + Sync {
    /// Acquire an attachment from the selected source.
    ///
    /// `constraints` is the merged media-constraint map; `"audio"` and
    /// `"video"` keys follow the usual convention where `false`
    /// disables the kind and any other value requests it.
    async fn acquire(&self, source: CaptureSource, constraints: &Value) -> Result<MediaAttachment>;
}

/// Capture provider that synthesizes negotiable track handles.
///
/// The tracks carry real codec capabilities and can be added to a peer
/// connection, but no frames are pumped into them; media generation is
/// the caller's concern once negotiation completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticCapture;

impl SyntheticCapture {
    fn audio_track(stream_id: &str) -> LocalMediaTrack {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: "audio/opus".to_string(),
                clock_rate: 48000,
                channels: 2,
                sdp_fmtp_line: String::new(),
                rtcp_feedback: vec![],
            },
            format!("audio-{}", stream_id),
            stream_id.to_string(),
        ));
        LocalMediaTrack::new(MediaKind::Audio, track)
    }

    fn video_track(stream_id: &str) -> LocalMediaTrack {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: "video/VP8".to_string(),
                clock_rate: 90000,
                channels: 0,
                sdp_fmtp_line: String::new(),
                rtcp_feedback: vec![],
            },
            format!("video-{}", stream_id),
            stream_id.to_string(),
        ));
        LocalMediaTrack::new(MediaKind::Video, track)
    }
}

fn kind_requested(constraints: &Value, key: &str, default: bool) -> bool {
    match constraints.get(key) {
        None => default,
        Some(Value::Bool(wanted)) => *wanted,
        // An object (or any other value) is a constraint set for the kind
        Some(Value::Null) => default,
        Some(_) => true,
    }
}

#[async_trait]
impl MediaCapture for SyntheticCapture {
    async fn acquire(&self, source: CaptureSource, constraints: &Value) -> Result<MediaAttachment> {
        let stream_id = format!("{}-{}", source, uuid::Uuid::new_v4());

        let mut tracks = Vec::new();
        // Screen capture has no microphone leg unless audio is asked for
        // explicitly.
        let audio_default = matches!(source, CaptureSource::Camera);
        if kind_requested(constraints, "audio", audio_default) {
            tracks.push(Self::audio_track(&stream_id));
        }
        if kind_requested(constraints, "video", true) {
            tracks.push(Self::video_track(&stream_id));
        }

        if tracks.is_empty() {
            return Err(Error::MediaAcquisition(format!(
                "constraints request no media from source '{}'",
                source
            )));
        }

        debug!(
            source = %source,
            stream_id = %stream_id,
            tracks = tracks.len(),
            "Acquired local media"
        );

        Ok(MediaAttachment::new(stream_id, tracks))
    }
}
