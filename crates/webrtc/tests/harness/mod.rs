//! Integration test harness
//!
//! Provides the collaborators the session and pipeline-client tests
//! negotiate against: recording sinks and capture providers, an
//! in-process answering peer, and a mock media server speaking the
//! JSON-RPC object API over a WebSocket.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use pipelink_webrtc::media::{
    CaptureSource, MediaAttachment, MediaCapture, MediaLocator, MediaSink, SyntheticCapture,
};
use pipelink_webrtc::peer::build_peer_connection;
use pipelink_webrtc::signaling::protocol::{
    error_codes, CreateParams, EventNotification, InvokeParams, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, SubscribeParams,
};
use pipelink_webrtc::{Error, Result, SessionEvent};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, warn};
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;

/// Sink recording every locator it is handed
#[derive(Default)]
pub struct RecordingSink {
    attached: Mutex<Vec<(MediaLocator, bool)>>,
    clears: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Locators attached so far, in order
    pub fn locators(&self) -> Vec<MediaLocator> {
        self.attached
            .lock()
            .unwrap()
            .iter()
            .map(|(locator, _)| locator.clone())
            .collect()
    }

    /// Whether the last attach was muted
    pub fn last_muted(&self) -> Option<bool> {
        self.attached.lock().unwrap().last().map(|(_, muted)| *muted)
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaSink for RecordingSink {
    async fn attach(&self, locator: MediaLocator, muted: bool) {
        self.attached.lock().unwrap().push((locator, muted));
    }

    async fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

/// Capture provider counting its acquisitions
#[derive(Default)]
pub struct RecordingCapture {
    calls: AtomicUsize,
}

impl RecordingCapture {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaCapture for RecordingCapture {
    async fn acquire(&self, source: CaptureSource, constraints: &Value) -> Result<MediaAttachment> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SyntheticCapture.acquire(source, constraints).await
    }
}

/// Capture provider that always denies acquisition
pub struct FailingCapture;

#[async_trait]
impl MediaCapture for FailingCapture {
    async fn acquire(
        &self,
        _source: CaptureSource,
        _constraints: &Value,
    ) -> Result<MediaAttachment> {
        Err(Error::MediaAcquisition("camera denied".to_string()))
    }
}

/// Wait for the first event matching `predicate`, discarding others
pub async fn wait_for_event<F>(
    rx: &mut mpsc::Receiver<SessionEvent>,
    predicate: F,
) -> Option<SessionEvent>
where
    F: Fn(&SessionEvent) -> bool,
{
    let deadline = Duration::from_secs(10);
    tokio::time::timeout(deadline, async {
        while let Some(event) = rx.recv().await {
            if predicate(&event) {
                return Some(event);
            }
            debug!(event = event.name(), "Skipping event");
        }
        None
    })
    .await
    .ok()
    .flatten()
}

/// Drain whatever events are immediately available
pub fn drain_events(rx: &mut mpsc::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Answer an offer with an in-process remote peer.
///
/// Returns the answering peer (so the caller controls its lifetime)
/// and the answer SDP.
pub async fn answer_offer(offer_sdp: &str) -> (Arc<RTCPeerConnection>, String) {
    let peer = build_peer_connection(&json!({ "iceServers": [] }))
        .await
        .expect("answering peer");

    let offer = RTCSessionDescription::offer(offer_sdp.to_string()).expect("offer sdp");
    peer.set_remote_description(offer).await.expect("set offer");

    let answer = peer.create_answer(None).await.expect("create answer");
    peer.set_local_description(answer)
        .await
        .expect("set answer");

    let sdp = peer
        .local_description()
        .await
        .expect("local description")
        .sdp;

    (peer, sdp)
}

/// Mock media server speaking the JSON-RPC object API.
///
/// Objects are tracked by id; `play` on any object fires a `CodeFound`
/// event for every live `CodeFound` subscription on a ZBarFilter.
pub struct MockMediaServer {
    addr: SocketAddr,
}

impl MockMediaServer {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(Self::handle_connection(stream));
            }
        });

        Self { addr }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    async fn handle_connection(stream: TcpStream) {
        let ws = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!("Mock server handshake failed: {}", e);
                return;
            }
        };
        let (mut write, mut read) = ws.split();

        let mut next_id = 0u32;
        // object id -> type name
        let mut objects: HashMap<String, String> = HashMap::new();
        // subscription id -> (object id, event type)
        let mut subscriptions: HashMap<String, (String, String)> = HashMap::new();

        while let Some(Ok(msg)) = read.next().await {
            let text = match msg {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };

            let Ok(request) = JsonRpcRequest::from_json(&text) else {
                warn!("Mock server could not parse: {}", text);
                continue;
            };
            let id = request.id.clone().unwrap_or(Value::Null);

            let reply = match request.method.as_str() {
                "create" => {
                    let params: CreateParams =
                        serde_json::from_value(request.params).expect("create params");
                    next_id += 1;
                    let object_id = format!("{}-{}", params.object_type, next_id);
                    objects.insert(object_id.clone(), params.object_type);
                    JsonRpcResponse::new(json!({ "value": object_id }), id)
                        .to_json()
                        .unwrap()
                }
                "invoke" => {
                    let params: InvokeParams =
                        serde_json::from_value(request.params).expect("invoke params");
                    if !objects.contains_key(&params.object) {
                        JsonRpcError::new(
                            error_codes::OBJECT_NOT_FOUND,
                            format!("no such object: {}", params.object),
                            id,
                        )
                        .to_json()
                        .unwrap()
                    } else {
                        if params.operation == "play" {
                            for (subscription, (object, event_type)) in &subscriptions {
                                let is_zbar = objects
                                    .get(object)
                                    .map(|t| t == "ZBarFilter")
                                    .unwrap_or(false);
                                if is_zbar && event_type == "CodeFound" {
                                    let notification = JsonRpcRequest::notification(
                                        "onEvent",
                                        serde_json::to_value(EventNotification {
                                            object: object.clone(),
                                            event_type: event_type.clone(),
                                            data: json!({
                                                "codeType": "QR-Code",
                                                "value": "https://pipelink.example/demo"
                                            }),
                                            subscription: subscription.clone(),
                                        })
                                        .unwrap(),
                                    );
                                    let _ = write
                                        .send(Message::Text(notification.to_json().unwrap()))
                                        .await;
                                }
                            }
                        }
                        JsonRpcResponse::new(json!({ "value": null }), id)
                            .to_json()
                            .unwrap()
                    }
                }
                "subscribe" => {
                    let params: SubscribeParams =
                        serde_json::from_value(request.params).expect("subscribe params");
                    next_id += 1;
                    let subscription = format!("sub-{}", next_id);
                    subscriptions.insert(subscription.clone(), (params.object, params.event_type));
                    JsonRpcResponse::new(json!({ "value": subscription }), id)
                        .to_json()
                        .unwrap()
                }
                "unsubscribe" => {
                    let params: SubscribeParams =
                        serde_json::from_value(request.params).expect("unsubscribe params");
                    if let Some(subscription) = params.subscription {
                        subscriptions.remove(&subscription);
                    }
                    JsonRpcResponse::new(json!({ "value": null }), id)
                        .to_json()
                        .unwrap()
                }
                "release" => {
                    objects.clear();
                    subscriptions.clear();
                    JsonRpcResponse::new(json!({ "value": null }), id)
                        .to_json()
                        .unwrap()
                }
                other => JsonRpcError::new(
                    error_codes::METHOD_NOT_FOUND,
                    format!("unknown method: {}", other),
                    id,
                )
                .to_json()
                .unwrap(),
            };

            if write.send(Message::Text(reply)).await.is_err() {
                break;
            }
        }

        debug!("Mock server connection closed");
    }
}
