//! Typed payloads for filter events delivered by the media server

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of a `CodeFound` event from the bar-code filter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CodeFound {
    /// Symbology of the recognized code (e.g. `"QR-Code"`, `"EAN-13"`)
    pub code_type: String,
    /// Decoded code contents
    pub value: String,
}

/// Payload of a `PlateDetected` event from the plate-detector filter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlateDetected {
    /// Recognized plate text
    pub plate: String,
}

/// A filter event with its payload decoded into the matching type
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEvent {
    /// Bar/QR code recognized
    CodeFound(CodeFound),
    /// License plate recognized
    PlateDetected(PlateDetected),
    /// Event type this catalog does not know; raw payload preserved
    Unknown {
        /// Event type name as sent by the server
        event_type: String,
        /// Undecoded payload
        data: Value,
    },
}

impl FilterEvent {
    /// Decode an event notification payload by its type name.
    ///
    /// Unknown event types are preserved rather than rejected, so new
    /// server-side filters do not break existing subscribers.
    pub fn parse(event_type: &str, data: &Value) -> Result<Self> {
        match event_type {
            "CodeFound" => {
                let payload: CodeFound = serde_json::from_value(data.clone())
                    .map_err(|e| Error::Element(format!("Invalid CodeFound payload: {}", e)))?;
                Ok(FilterEvent::CodeFound(payload))
            }
            "PlateDetected" => {
                let payload: PlateDetected = serde_json::from_value(data.clone())
                    .map_err(|e| Error::Element(format!("Invalid PlateDetected payload: {}", e)))?;
                Ok(FilterEvent::PlateDetected(payload))
            }
            other => {
                tracing::debug!(event_type = other, "Unknown filter event type");
                Ok(FilterEvent::Unknown {
                    event_type: other.to_string(),
                    data: data.clone(),
                })
            }
        }
    }
}
