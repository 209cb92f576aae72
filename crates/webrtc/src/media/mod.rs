//! Local and remote media attachments
//!
//! A media attachment bundles the track handles coming from one source:
//! locally from a capture provider, remotely from an applied answer.
//! Local tracks carry their own mute and stop state; the negotiation
//! engine sees them as plain `TrackLocal` handles.

pub mod capture;
pub mod sink;

pub use capture::{CaptureSource, MediaCapture, SyntheticCapture};
pub use sink::{MediaLocator, MediaSink};

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_local::TrackLocal;

/// Kind of a media track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Audio track
    Audio,
    /// Video track
    Video,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// One local track handle plus its mute/stop state
#[derive(Clone)]
pub struct LocalMediaTrack {
    kind: MediaKind,
    track: Arc<TrackLocalStaticSample>,
    enabled: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
}

impl LocalMediaTrack {
    /// Wrap a sample track handle
    pub fn new(kind: MediaKind, track: Arc<TrackLocalStaticSample>) -> Self {
        Self {
            kind,
            track,
            enabled: Arc::new(AtomicBool::new(true)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Track kind
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Whether the track currently produces media
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Mute or unmute the track
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Stop the track; a stopped track never resumes
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Whether the track has been stopped
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Handle for attaching the track to a peer connection
    pub fn local(&self) -> Arc<dyn TrackLocal + Send + Sync> {
        Arc::clone(&self.track) as Arc<dyn TrackLocal + Send + Sync>
    }

    /// The underlying sample track
    pub fn sample_track(&self) -> &Arc<TrackLocalStaticSample> {
        &self.track
    }
}

impl std::fmt::Debug for LocalMediaTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalMediaTrack")
            .field("kind", &self.kind)
            .field("enabled", &self.is_enabled())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// A bundled set of local track handles from one source
#[derive(Debug, Clone)]
pub struct MediaAttachment {
    id: String,
    tracks: Vec<LocalMediaTrack>,
}

impl MediaAttachment {
    /// Create an attachment from the tracks of one source
    pub fn new(id: impl Into<String>, tracks: Vec<LocalMediaTrack>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    /// Source identifier, shared by every track in the bundle
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All tracks in the bundle
    pub fn tracks(&self) -> &[LocalMediaTrack] {
        &self.tracks
    }

    /// Tracks of the given kind
    pub fn tracks_of_kind(&self, kind: MediaKind) -> impl Iterator<Item = &LocalMediaTrack> {
        self.tracks.iter().filter(move |t| t.kind() == kind)
    }

    /// Whether the bundle holds no tracks
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Stop every track in the bundle
    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    /// Locator for a local preview of this attachment
    pub fn preview_locator(&self) -> MediaLocator {
        MediaLocator::for_stream(&self.id)
    }
}

/// Descriptor of one remote media bundle, recorded from an applied
/// remote description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAttachment {
    stream_id: String,
    kinds: Vec<MediaKind>,
}

impl RemoteAttachment {
    /// Extract the first remote media bundle described by an SDP text.
    ///
    /// The stream identifier comes from the first `a=msid:` attribute
    /// when present. Returns `None` when the SDP describes no media
    /// sections.
    pub fn from_sdp(sdp: &str) -> Option<Self> {
        let mut kinds = Vec::new();
        let mut stream_id = None;

        for line in sdp.lines() {
            let line = line.trim_end();
            if line.starts_with("m=audio") {
                if !kinds.contains(&MediaKind::Audio) {
                    kinds.push(MediaKind::Audio);
                }
            } else if line.starts_with("m=video") {
                if !kinds.contains(&MediaKind::Video) {
                    kinds.push(MediaKind::Video);
                }
            } else if stream_id.is_none() {
                if let Some(rest) = line.strip_prefix("a=msid:") {
                    let id = rest.split_whitespace().next().unwrap_or_default();
                    if !id.is_empty() && id != "-" {
                        stream_id = Some(id.to_string());
                    }
                }
            }
        }

        if kinds.is_empty() {
            return None;
        }

        Some(Self {
            stream_id: stream_id.unwrap_or_else(|| format!("remote-{}", uuid::Uuid::new_v4())),
            kinds,
        })
    }

    /// Remote stream identifier
    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// Media kinds present in the bundle
    pub fn kinds(&self) -> &[MediaKind] {
        &self.kinds
    }

    /// Dereferenceable locator for the remote stream
    pub fn locator(&self) -> MediaLocator {
        MediaLocator::for_stream(&self.stream_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;

    fn sample_track(kind: MediaKind) -> LocalMediaTrack {
        let (mime_type, clock_rate, channels) = match kind {
            MediaKind::Audio => ("audio/opus".to_string(), 48000, 2),
            MediaKind::Video => ("video/VP8".to_string(), 90000, 0),
        };
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type,
                clock_rate,
                channels,
                sdp_fmtp_line: String::new(),
                rtcp_feedback: vec![],
            },
            format!("{}-test", kind),
            "test-stream".to_string(),
        ));
        LocalMediaTrack::new(kind, track)
    }

    #[test]
    fn test_track_enable_and_stop() {
        let track = sample_track(MediaKind::Audio);
        assert!(track.is_enabled());
        assert!(!track.is_stopped());

        track.set_enabled(false);
        assert!(!track.is_enabled());

        track.stop();
        assert!(track.is_stopped());
    }

    #[test]
    fn test_attachment_stop_stops_every_track() {
        let attachment = MediaAttachment::new(
            "cam-0",
            vec![sample_track(MediaKind::Audio), sample_track(MediaKind::Video)],
        );
        attachment.stop();
        assert!(attachment.tracks().iter().all(|t| t.is_stopped()));
    }

    #[test]
    fn test_attachment_kind_filter() {
        let attachment = MediaAttachment::new(
            "cam-0",
            vec![sample_track(MediaKind::Audio), sample_track(MediaKind::Video)],
        );
        assert_eq!(attachment.tracks_of_kind(MediaKind::Audio).count(), 1);
        assert_eq!(attachment.tracks_of_kind(MediaKind::Video).count(), 1);
        assert_eq!(attachment.preview_locator().as_str(), "stream://cam-0");
    }

    #[test]
    fn test_remote_attachment_from_sdp() {
        let sdp = "v=0\r\n\
                   o=- 0 0 IN IP4 127.0.0.1\r\n\
                   s=-\r\n\
                   m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n\
                   a=msid:stream-7 track-a\r\n\
                   m=video 9 UDP/TLS/RTP/SAVPF 96\r\n\
                   a=msid:stream-7 track-v\r\n";

        let attachment = RemoteAttachment::from_sdp(sdp).unwrap();
        assert_eq!(attachment.stream_id(), "stream-7");
        assert_eq!(attachment.kinds(), &[MediaKind::Audio, MediaKind::Video]);
        assert_eq!(attachment.locator().as_str(), "stream://stream-7");
    }

    #[test]
    fn test_remote_attachment_without_media_sections() {
        let sdp = "v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\ns=-\r\n";
        assert!(RemoteAttachment::from_sdp(sdp).is_none());
    }

    #[test]
    fn test_remote_attachment_generates_id_without_msid() {
        let sdp = "v=0\r\nm=video 9 UDP/TLS/RTP/SAVPF 96\r\n";
        let attachment = RemoteAttachment::from_sdp(sdp).unwrap();
        assert!(attachment.stream_id().starts_with("remote-"));
        assert!(!attachment.locator().is_empty());
    }
}
