//! WebSocket client for the media server object API

use super::objects::MediaPipelineHandle;
use super::protocol::*;
use crate::{Error, Result};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

type PendingReply = oneshot::Sender<std::result::Result<Value, ErrorObject>>;

/// JSON-RPC 2.0 client driving remote pipeline objects
///
/// One request at a time is not required: requests are matched to
/// responses by id through a pending map, and server `onEvent`
/// notifications are routed to per-subscription channels. Clones share
/// the underlying connection.
#[derive(Clone)]
pub struct PipelineClient {
    /// Outgoing message sender
    tx: mpsc::UnboundedSender<Message>,

    /// In-flight requests awaiting their response
    pending: Arc<Mutex<HashMap<String, PendingReply>>>,

    /// Event routes keyed by subscription id
    subscriptions: Arc<Mutex<HashMap<String, mpsc::Sender<EventNotification>>>>,
}

impl PipelineClient {
    /// Connect to the media server.
    ///
    /// Establishes the WebSocket connection and starts the background
    /// sender and receiver tasks.
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to media server: {}", url);

        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| Error::Signaling(format!("Failed to connect: {}", e)))?;

        info!("Connected to media server");

        let (write, read) = ws_stream.split();
        let (tx, rx) = mpsc::unbounded_channel();

        let pending = Arc::new(Mutex::new(HashMap::new()));
        let subscriptions = Arc::new(Mutex::new(HashMap::new()));

        tokio::spawn(Self::sender_task(write, rx));
        tokio::spawn(Self::receiver_task(
            read,
            Arc::clone(&pending),
            Arc::clone(&subscriptions),
        ));

        Ok(Self {
            tx,
            pending,
            subscriptions,
        })
    }

    /// Sender task: forwards messages from the channel to the WebSocket
    async fn sender_task(
        mut write: futures::stream::SplitSink<WsStream, Message>,
        mut rx: mpsc::UnboundedReceiver<Message>,
    ) {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = write.send(msg).await {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }
        }

        debug!("Sender task terminated");
    }

    /// Receiver task: matches responses to pending requests and routes
    /// event notifications
    async fn receiver_task(
        mut read: futures::stream::SplitStream<WsStream>,
        pending: Arc<Mutex<HashMap<String, PendingReply>>>,
        subscriptions: Arc<Mutex<HashMap<String, mpsc::Sender<EventNotification>>>>,
    ) {
        while let Some(msg_result) = read.next().await {
            match msg_result {
                Ok(Message::Text(text)) => {
                    if let Err(e) = Self::handle_message(&text, &pending, &subscriptions).await {
                        warn!("Failed to handle server message: {}", e);
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("Media server connection closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        // Fail whatever is still in flight so callers do not hang
        let mut map = pending.lock();
        for (_, reply) in map.drain() {
            let _ = reply.send(Err(ErrorObject {
                code: error_codes::INTERNAL_ERROR,
                message: "connection closed".to_string(),
                data: None,
            }));
        }

        debug!("Receiver task terminated");
    }

    async fn handle_message(
        text: &str,
        pending: &Arc<Mutex<HashMap<String, PendingReply>>>,
        subscriptions: &Arc<Mutex<HashMap<String, mpsc::Sender<EventNotification>>>>,
    ) -> Result<()> {
        debug!("Received server message: {}", text);

        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::Signaling(format!("Invalid JSON from server: {}", e)))?;

        if value.get("result").is_some() {
            let response: JsonRpcResponse = serde_json::from_value(value)?;
            Self::complete(pending, &response.id, Ok(response.result));
            return Ok(());
        }

        if value.get("error").is_some() {
            let response: JsonRpcError = serde_json::from_value(value)?;
            Self::complete(pending, &response.id, Err(response.error));
            return Ok(());
        }

        let request: JsonRpcRequest = serde_json::from_value(value)
            .map_err(|e| Error::Signaling(format!("Invalid notification: {}", e)))?;

        match request.method.as_str() {
            "onEvent" => {
                let notification: EventNotification = serde_json::from_value(request.params)
                    .map_err(|e| Error::Signaling(format!("Invalid onEvent params: {}", e)))?;

                let route = subscriptions
                    .lock()
                    .get(&notification.subscription)
                    .cloned();
                match route {
                    Some(tx) => {
                        if let Err(e) = tx.send(notification).await {
                            warn!("Event subscriber dropped: {}", e);
                        }
                    }
                    None => {
                        debug!(
                            subscription = %notification.subscription,
                            "Event for unknown subscription"
                        );
                    }
                }
            }
            other => warn!("Unknown server method: {}", other),
        }

        Ok(())
    }

    fn complete(
        pending: &Arc<Mutex<HashMap<String, PendingReply>>>,
        id: &Value,
        outcome: std::result::Result<Value, ErrorObject>,
    ) {
        let Some(id) = id.as_str() else {
            warn!("Response with non-string id: {}", id);
            return;
        };
        match pending.lock().remove(id) {
            Some(reply) => {
                let _ = reply.send(outcome);
            }
            None => warn!("Response for unknown request id: {}", id),
        }
    }

    /// Issue a request and await the matching response
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = uuid::Uuid::new_v4().to_string();
        let (reply_tx, reply_rx) = oneshot::channel();

        self.pending.lock().insert(id.clone(), reply_tx);

        let request = JsonRpcRequest::new(method, params, id.clone());
        let text = request.to_json()?;
        debug!("Sending request: {}", text);

        if self.tx.send(Message::Text(text)).is_err() {
            self.pending.lock().remove(&id);
            return Err(Error::Signaling("connection closed".to_string()));
        }

        match reply_rx.await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(err)) => Err(Error::Protocol {
                code: err.code,
                message: err.message,
            }),
            Err(_) => Err(Error::Signaling("connection closed".to_string())),
        }
    }

    /// Create a remote object; returns its id
    pub async fn create(
        &self,
        object_type: &str,
        constructor_params: Value,
        parent: Option<&str>,
    ) -> Result<String> {
        let params = serde_json::to_value(CreateParams {
            object_type: object_type.to_string(),
            constructor_params,
            parent: parent.map(str::to_string),
        })?;

        let result = self.request("create", params).await?;
        result["value"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::Signaling("create response missing object id".to_string()))
    }

    /// Invoke an operation on a remote object
    pub async fn invoke(&self, object: &str, operation: &str, params: Value) -> Result<Value> {
        let params = serde_json::to_value(InvokeParams {
            object: object.to_string(),
            operation: operation.to_string(),
            operation_params: params,
        })?;

        let result = self.request("invoke", params).await?;
        Ok(result.get("value").cloned().unwrap_or(Value::Null))
    }

    /// Subscribe to an event type on a remote object.
    ///
    /// Returns the subscription id and the channel the events arrive on.
    pub async fn subscribe(
        &self,
        object: &str,
        event_type: &str,
    ) -> Result<(String, mpsc::Receiver<EventNotification>)> {
        let params = serde_json::to_value(SubscribeParams {
            object: object.to_string(),
            event_type: event_type.to_string(),
            subscription: None,
        })?;

        let result = self.request("subscribe", params).await?;
        let subscription = result["value"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                Error::Signaling("subscribe response missing subscription id".to_string())
            })?;

        let (tx, rx) = mpsc::channel(16);
        self.subscriptions.lock().insert(subscription.clone(), tx);

        debug!(subscription = %subscription, event_type, "Subscribed");

        Ok((subscription, rx))
    }

    /// Cancel a subscription
    pub async fn unsubscribe(&self, object: &str, subscription: &str) -> Result<()> {
        let params = serde_json::to_value(SubscribeParams {
            object: object.to_string(),
            event_type: String::new(),
            subscription: Some(subscription.to_string()),
        })?;

        self.request("unsubscribe", params).await?;
        self.subscriptions.lock().remove(subscription);
        Ok(())
    }

    /// Release a remote object and everything it contains
    pub async fn release(&self, object: &str) -> Result<()> {
        let params = serde_json::to_value(ReleaseParams {
            object: object.to_string(),
        })?;
        self.request("release", params).await?;
        Ok(())
    }

    /// Create a media pipeline container
    pub async fn create_pipeline(&self) -> Result<MediaPipelineHandle> {
        let id = self.create("MediaPipeline", json!({}), None).await?;
        info!(pipeline = %id, "Created media pipeline");
        Ok(MediaPipelineHandle::new(self.clone(), id))
    }

    /// Close the connection to the media server
    pub fn disconnect(&self) {
        let _ = self.tx.send(Message::Close(None));
    }
}
