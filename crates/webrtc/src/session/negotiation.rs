//! Negotiation session wrapping one peer connection
//!
//! The session owns exactly one peer handle for its whole lifetime:
//! created here (or borrowed from the caller), mutated only by the two
//! negotiation calls and the engine's callbacks, and closed by
//! [`NegotiationSession::dispose`]. No negotiation step is retried
//! automatically and none carries a built-in timeout; callers impose
//! their own bounds around the returned futures.

use crate::config::{
    default_media_constraints, merged_rtc_configuration, offer_constraints, receive_flags,
    SessionOptions,
};
use crate::events::{CandidateDescriptor, SessionEvent};
use crate::media::{
    CaptureSource, MediaAttachment, MediaCapture, MediaKind, MediaSink, RemoteAttachment,
    SyntheticCapture,
};
use crate::peer::build_peer_connection;
use crate::session::{MediaMode, SdpOffer, SessionState};
use crate::{Error, Result};
use pipelink_core::config::recursive;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, warn};
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::peer_connection::RTCPeerConnection;

/// End-of-candidates emission guard.
///
/// Emits once per gathering phase; a candidate arriving after the end
/// signal opens a new phase (renegotiation), so a later end signal
/// emits again.
#[derive(Debug, Default)]
struct GatheringFlag {
    done: AtomicBool,
}

impl GatheringFlag {
    fn candidate_seen(&self) {
        self.done.store(false, Ordering::SeqCst);
    }

    /// Returns true when the end event should be emitted
    fn end_of_candidates(&self) -> bool {
        !self.done.swap(true, Ordering::SeqCst)
    }

    fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

/// Session negotiation lifecycle wrapper
///
/// Sequences the offer/answer exchange against one peer connection and
/// manages the local media-track lifecycle: acquisition before the
/// offer when the mode sends media, mute/unmute across every local
/// track, and teardown on dispose.
pub struct NegotiationSession {
    mode: MediaMode,
    peer: Arc<RTCPeerConnection>,
    configuration: Value,
    media_constraints: Value,
    connection_constraints: Option<Value>,
    capture: Arc<dyn MediaCapture>,
    capture_source: CaptureSource,
    local_sink: Option<Arc<dyn MediaSink>>,
    remote_sink: Option<Arc<dyn MediaSink>>,
    events: Option<mpsc::Sender<SessionEvent>>,
    state: Arc<RwLock<SessionState>>,
    local_attachments: Arc<RwLock<Vec<MediaAttachment>>>,
    remote_attachments: Arc<RwLock<Vec<RemoteAttachment>>>,
    gathering: Arc<GatheringFlag>,
    media_wired: AtomicBool,
    disposed: AtomicBool,
}

impl NegotiationSession {
    /// Create a session for the given mode.
    ///
    /// Builds the peer handle unless one is supplied in `options` and
    /// subscribes to candidate discovery immediately. No media I/O
    /// happens here; acquisition is deferred to [`start`](Self::start).
    pub async fn new(mode: MediaMode, options: SessionOptions) -> Result<Self> {
        let configuration = merged_rtc_configuration(mode, options.configuration.as_ref());

        let peer = match options.peer {
            Some(peer) => {
                debug!("Using externally supplied peer handle");
                peer
            }
            None => build_peer_connection(&configuration).await?,
        };

        let media_constraints = recursive(
            &default_media_constraints(),
            &options.media_constraints.unwrap_or(Value::Null),
        );

        let mut local_attachments = Vec::new();
        if let Some(attachment) = options.video_attachment {
            local_attachments.push(attachment);
        }
        if let Some(attachment) = options.audio_attachment {
            local_attachments.push(attachment);
        }

        let session = Self {
            mode,
            peer,
            configuration,
            media_constraints,
            connection_constraints: options.connection_constraints,
            capture: options
                .capture
                .unwrap_or_else(|| Arc::new(SyntheticCapture)),
            capture_source: options.capture_source,
            local_sink: options.local_sink,
            remote_sink: options.remote_sink,
            events: options.events,
            state: Arc::new(RwLock::new(SessionState::New)),
            local_attachments: Arc::new(RwLock::new(local_attachments)),
            remote_attachments: Arc::new(RwLock::new(Vec::new())),
            gathering: Arc::new(GatheringFlag::default()),
            media_wired: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        };

        session.subscribe_candidates();

        info!(mode = %mode, "Created negotiation session");

        Ok(session)
    }

    /// Forward candidate discovery to the session event channel
    fn subscribe_candidates(&self) {
        let events = self.events.clone();
        let gathering = Arc::clone(&self.gathering);

        self.peer.on_ice_candidate(Box::new(move |candidate| {
            let events = events.clone();
            let gathering = Arc::clone(&gathering);

            Box::pin(async move {
                match candidate {
                    Some(candidate) => {
                        gathering.candidate_seen();
                        match candidate.to_json() {
                            Ok(init) => {
                                let descriptor = CandidateDescriptor {
                                    candidate: init.candidate,
                                    sdp_mid: init.sdp_mid,
                                    sdp_mline_index: init.sdp_mline_index,
                                };
                                if let Some(tx) = &events {
                                    if let Err(e) =
                                        tx.send(SessionEvent::IceCandidate(descriptor)).await
                                    {
                                        warn!("Failed to emit ICE candidate: {}", e);
                                    }
                                }
                            }
                            Err(e) => warn!("Failed to serialize ICE candidate: {}", e),
                        }
                    }
                    None => {
                        if gathering.end_of_candidates() {
                            debug!("ICE candidate gathering complete");
                            if let Some(tx) = &events {
                                if let Err(e) = tx.send(SessionEvent::IceGatheringDone).await {
                                    warn!("Failed to emit gathering-done: {}", e);
                                }
                            }
                        }
                    }
                }
            })
        }));
    }

    /// Start negotiation: acquire local media when the mode needs it,
    /// attach tracks, create the offer and set it as the local
    /// description.
    ///
    /// The offer is emitted as [`SessionEvent::OfferReady`] for the
    /// signaling collaborator and returned to the caller. Failures are
    /// not retried; re-invoke to attempt a fresh negotiation.
    pub async fn start(&self, extra_constraints: Option<Value>) -> Result<SdpOffer> {
        if self.peer.signaling_state() == RTCSignalingState::Closed {
            return Err(Error::ConnectionClosed);
        }

        if self.mode.requires_outbound_media() && self.local_attachments.read().await.is_empty() {
            self.set_state(SessionState::AcquiringMedia).await;
            let attachment = match self
                .capture
                .acquire(self.capture_source, &self.media_constraints)
                .await
            {
                Ok(attachment) => attachment,
                Err(e) => {
                    let err = match e {
                        err @ Error::MediaAcquisition(_) => err,
                        other => Error::MediaAcquisition(other.to_string()),
                    };
                    self.report(&err).await;
                    return Err(err);
                }
            };
            info!(
                stream_id = attachment.id(),
                tracks = attachment.tracks().len(),
                "Local media acquired"
            );
            self.local_attachments.write().await.push(attachment);
        }

        let constraints = {
            let mut layers: Vec<&Value> = Vec::new();
            if let Some(connection) = &self.connection_constraints {
                layers.push(connection);
            }
            if let Some(extra) = &extra_constraints {
                layers.push(extra);
            }
            offer_constraints(self.mode, &layers)
        };
        debug!(constraints = %constraints, "Offer constraints");

        self.wire_media(&constraints).await?;

        let offer = match self.peer.create_offer(None).await {
            Ok(offer) => offer,
            Err(e) => {
                let err = Error::Negotiation(format!("Failed to create offer: {}", e));
                self.report(&err).await;
                return Err(err);
            }
        };
        self.set_state(SessionState::OfferCreated).await;

        if let Err(e) = self.peer.set_local_description(offer.clone()).await {
            let err = Error::Negotiation(format!("Failed to set local description: {}", e));
            self.report(&err).await;
            return Err(err);
        }
        self.set_state(SessionState::LocalDescriptionSet).await;

        let sdp = self
            .peer
            .local_description()
            .await
            .map(|desc| desc.sdp)
            .unwrap_or(offer.sdp);

        self.emit(SessionEvent::OfferReady { sdp: sdp.clone() }).await;
        self.set_state(SessionState::AwaitingAnswer).await;

        info!("SDP offer ready");

        Ok(SdpOffer { sdp })
    }

    /// Attach local tracks and the receive transceivers the offer
    /// constraints ask for. Runs once; a retried negotiation reuses the
    /// wiring from the first attempt.
    async fn wire_media(&self, constraints: &Value) -> Result<()> {
        if self.media_wired.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let attachments = self.local_attachments.read().await;

        for attachment in attachments.iter() {
            for track in attachment.tracks() {
                self.peer.add_track(track.local()).await.map_err(|e| {
                    Error::Negotiation(format!("Failed to attach local track: {}", e))
                })?;
            }
            debug!(stream_id = attachment.id(), "Attached local tracks");
        }

        if let (Some(sink), Some(first)) = (&self.local_sink, attachments.first()) {
            sink.attach(first.preview_locator(), true).await;
        }

        let sends_audio = attachments
            .iter()
            .any(|a| a.tracks_of_kind(MediaKind::Audio).next().is_some());
        let sends_video = attachments
            .iter()
            .any(|a| a.tracks_of_kind(MediaKind::Video).next().is_some());
        drop(attachments);

        // A send track already negotiates its kind; stand-alone receive
        // legs need their own transceivers.
        use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
        let (receive_audio, receive_video) = receive_flags(constraints);
        if receive_audio && !sends_audio {
            self.peer
                .add_transceiver_from_kind(RTPCodecType::Audio, None)
                .await
                .map_err(|e| Error::Negotiation(format!("Failed to add audio transceiver: {}", e)))?;
        }
        if receive_video && !sends_video {
            self.peer
                .add_transceiver_from_kind(RTPCodecType::Video, None)
                .await
                .map_err(|e| Error::Negotiation(format!("Failed to add video transceiver: {}", e)))?;
        }

        Ok(())
    }

    /// Apply the remote answer.
    ///
    /// Rejected with [`Error::ConnectionClosed`] once the handle is
    /// closed. On success the first remote media bundle (if any) is
    /// recorded and its locator handed to the remote sink.
    pub async fn process_answer(&self, answer_sdp: &str) -> Result<()> {
        if self.peer.signaling_state() == RTCSignalingState::Closed {
            return Err(Error::ConnectionClosed);
        }

        let answer = match RTCSessionDescription::answer(answer_sdp.to_string()) {
            Ok(answer) => answer,
            Err(e) => {
                let err = Error::RemoteDescription(format!("Failed to parse answer: {}", e));
                self.report(&err).await;
                self.set_state(SessionState::Failed).await;
                return Err(err);
            }
        };

        if let Err(e) = self.peer.set_remote_description(answer).await {
            let err = Error::RemoteDescription(format!("Failed to set remote description: {}", e));
            self.report(&err).await;
            self.set_state(SessionState::Failed).await;
            return Err(err);
        }

        if let Some(attachment) = RemoteAttachment::from_sdp(answer_sdp) {
            let locator = attachment.locator();
            info!(stream_id = attachment.stream_id(), "Remote media attached");
            self.remote_attachments.write().await.push(attachment);

            if let Some(sink) = &self.remote_sink {
                sink.attach(locator.clone(), false).await;
            }
            self.emit(SessionEvent::RemoteMediaAvailable { locator }).await;
        }

        self.set_state(SessionState::AnswerApplied).await;

        Ok(())
    }

    /// Forward a remotely received ICE candidate into the peer handle.
    ///
    /// Thin pass-through; the engine performs whatever validation it
    /// enforces.
    pub async fn add_ice_candidate(&self, candidate: CandidateDescriptor) -> Result<()> {
        debug!(candidate = %candidate.candidate, "Adding remote ICE candidate");

        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_mline_index,
            username_fragment: None,
        };

        self.peer
            .add_ice_candidate(init)
            .await
            .map_err(|e| Error::Candidate(format!("Failed to add ICE candidate: {}", e)))
    }

    /// Whether every local audio track is enabled.
    ///
    /// `None` when the session holds no local attachment, which is
    /// distinct from `Some(false)` (media present but muted).
    pub async fn audio_enabled(&self) -> Option<bool> {
        self.kind_enabled(MediaKind::Audio).await
    }

    /// Mute or unmute every local audio track
    pub async fn set_audio_enabled(&self, enabled: bool) {
        self.set_kind_enabled(MediaKind::Audio, enabled).await;
    }

    /// Whether every local video track is enabled; `None` without local
    /// attachments
    pub async fn video_enabled(&self) -> Option<bool> {
        self.kind_enabled(MediaKind::Video).await
    }

    /// Mute or unmute every local video track
    pub async fn set_video_enabled(&self, enabled: bool) {
        self.set_kind_enabled(MediaKind::Video, enabled).await;
    }

    /// Combined accessor over both kinds
    pub async fn enabled(&self) -> Option<bool> {
        match (self.audio_enabled().await, self.video_enabled().await) {
            (Some(audio), Some(video)) => Some(audio && video),
            _ => None,
        }
    }

    /// Mute or unmute every local track of both kinds
    pub async fn set_enabled(&self, enabled: bool) {
        self.set_audio_enabled(enabled).await;
        self.set_video_enabled(enabled).await;
    }

    async fn kind_enabled(&self, kind: MediaKind) -> Option<bool> {
        let attachments = self.local_attachments.read().await;
        if attachments.is_empty() {
            return None;
        }
        let result = attachments
            .iter()
            .flat_map(|a| a.tracks_of_kind(kind))
            .all(|t| t.is_enabled());
        Some(result)
    }

    async fn set_kind_enabled(&self, kind: MediaKind, enabled: bool) {
        for attachment in self.local_attachments.read().await.iter() {
            for track in attachment.tracks_of_kind(kind) {
                track.set_enabled(enabled);
            }
        }
    }

    /// Release session resources: stop every local track, close the
    /// peer handle, clear managed sinks.
    ///
    /// Idempotent; a no-op when the handle is already closed.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            debug!("Session already disposed");
            return;
        }
        if self.peer.signaling_state() == RTCSignalingState::Closed {
            debug!("Peer handle already closed");
            return;
        }

        info!("Disposing negotiation session");

        for attachment in self.local_attachments.read().await.iter() {
            attachment.stop();
        }

        if let Err(e) = self.peer.close().await {
            warn!("Error closing peer connection: {}", e);
        }

        if let Some(sink) = &self.local_sink {
            sink.clear().await;
        }
        if let Some(sink) = &self.remote_sink {
            sink.clear().await;
        }

        self.set_state(SessionState::Closed).await;
        self.emit(SessionEvent::Disposed).await;
    }

    /// Session mode
    pub fn mode(&self) -> MediaMode {
        self.mode
    }

    /// Merged ICE/transport configuration the session runs with
    pub fn configuration(&self) -> &Value {
        &self.configuration
    }

    /// The underlying peer handle
    pub fn peer(&self) -> &Arc<RTCPeerConnection> {
        &self.peer
    }

    /// Current lifecycle state
    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    /// Whether candidate gathering has signalled completion
    pub fn candidate_gathering_done(&self) -> bool {
        self.gathering.is_done()
    }

    /// Local attachment by index
    pub async fn local_attachment(&self, index: usize) -> Option<MediaAttachment> {
        self.local_attachments.read().await.get(index).cloned()
    }

    /// Remote attachment by index
    pub async fn remote_attachment(&self, index: usize) -> Option<RemoteAttachment> {
        self.remote_attachments.read().await.get(index).cloned()
    }

    async fn set_state(&self, new_state: SessionState) {
        let mut state = self.state.write().await;
        if *state != new_state {
            debug!("Session state transition: {:?} -> {:?}", *state, new_state);
            *state = new_state;
        }
    }

    async fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            if let Err(e) = tx.send(event).await {
                warn!("Failed to emit session event: {}", e);
            }
        }
    }

    /// Surface a failure on the event channel, falling back to a
    /// diagnostic trace when no channel is configured
    async fn report(&self, err: &Error) {
        match &self.events {
            Some(_) => {
                self.emit(SessionEvent::Error {
                    code: err.code(),
                    message: err.to_string(),
                })
                .await;
            }
            None => error!(code = %err.code(), "{}", err),
        }
    }
}

impl std::fmt::Debug for NegotiationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NegotiationSession")
            .field("mode", &self.mode)
            .field("gathering_done", &self.gathering.is_done())
            .field("disposed", &self.disposed.load(Ordering::SeqCst))
            .finish()
    }
}
