//! Handles binding element descriptors to live remote objects

use super::client::PipelineClient;
use super::protocol::EventNotification;
use crate::Result;
use pipelink_core::elements::ElementDescriptor;
use serde_json::{json, Value};
use tokio::sync::mpsc;

/// Handle to a remote media pipeline container
pub struct MediaPipelineHandle {
    client: PipelineClient,
    id: String,
}

impl MediaPipelineHandle {
    pub(crate) fn new(client: PipelineClient, id: String) -> Self {
        Self { client, id }
    }

    /// Remote object id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Create an element inside this pipeline
    pub async fn create_element<D: ElementDescriptor>(
        &self,
        descriptor: &D,
    ) -> Result<ElementHandle> {
        let id = self
            .client
            .create(
                descriptor.type_name(),
                descriptor.constructor_params(),
                Some(&self.id),
            )
            .await?;

        Ok(ElementHandle {
            client: self.client.clone(),
            id,
            type_name: descriptor.type_name().to_string(),
        })
    }

    /// Release the pipeline and every element it contains
    pub async fn release(&self) -> Result<()> {
        self.client.release(&self.id).await
    }
}

/// Handle to one element of a remote pipeline
pub struct ElementHandle {
    client: PipelineClient,
    id: String,
    type_name: String,
}

impl ElementHandle {
    /// Remote object id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Remote type name the element was created as
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Connect this element's output to `sink`'s input
    pub async fn connect(&self, sink: &ElementHandle) -> Result<()> {
        self.client
            .invoke(&self.id, "connect", json!({ "sink": sink.id }))
            .await?;
        Ok(())
    }

    /// Invoke an arbitrary operation on the element
    pub async fn invoke(&self, operation: &str, params: Value) -> Result<Value> {
        self.client.invoke(&self.id, operation, params).await
    }

    /// Start playback (player endpoints)
    pub async fn play(&self) -> Result<()> {
        self.invoke("play", json!({})).await?;
        Ok(())
    }

    /// Subscribe to an event type emitted by the element
    pub async fn subscribe(&self, event_type: &str) -> Result<EventSubscription> {
        let (id, events) = self.client.subscribe(&self.id, event_type).await?;
        Ok(EventSubscription { id, events })
    }

    /// Release the element
    pub async fn release(&self) -> Result<()> {
        self.client.release(&self.id).await
    }
}

/// A live event subscription on a remote element
pub struct EventSubscription {
    id: String,
    events: mpsc::Receiver<EventNotification>,
}

impl EventSubscription {
    /// Subscription id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Receive the next event, `None` once the route is closed
    pub async fn recv(&mut self) -> Option<EventNotification> {
        self.events.recv().await
    }
}
