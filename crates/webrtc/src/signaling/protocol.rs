//! JSON-RPC 2.0 protocol types for the media server object API

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC 2.0 protocol version
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    /// Protocol version (must be "2.0")
    pub jsonrpc: String,

    /// Method name to invoke
    pub method: String,

    /// Method parameters
    pub params: Value,

    /// Request ID for matching with response (absent for notifications)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl JsonRpcRequest {
    /// Build a request carrying an id
    pub fn new(method: impl Into<String>, params: Value, id: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: Some(Value::String(id.into())),
        }
    }

    /// Build a notification (no response expected)
    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: None,
        }
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// JSON-RPC 2.0 response (success)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    /// Protocol version (must be "2.0")
    pub jsonrpc: String,

    /// Result data
    pub result: Value,

    /// Request ID this response corresponds to
    pub id: Value,
}

impl JsonRpcResponse {
    /// Build a response for the given request id
    pub fn new(result: Value, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result,
            id,
        }
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// JSON-RPC 2.0 error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    /// Protocol version (must be "2.0")
    pub jsonrpc: String,

    /// Error details
    pub error: ErrorObject,

    /// Request ID this error corresponds to
    pub id: Value,
}

impl JsonRpcError {
    /// Build an error response for the given request id
    pub fn new(code: i64, message: impl Into<String>, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            error: ErrorObject {
                code,
                message: message.into(),
                data: None,
            },
            id,
        }
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorObject {
    /// Error code
    pub code: i64,

    /// Human-readable error message
    pub message: String,

    /// Additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Standard JSON-RPC 2.0 error codes plus the media-server specific set
pub mod error_codes {
    /// Invalid JSON was received
    pub const PARSE_ERROR: i64 = -32700;

    /// The JSON sent is not a valid Request object
    pub const INVALID_REQUEST: i64 = -32600;

    /// The method does not exist / is not available
    pub const METHOD_NOT_FOUND: i64 = -32601;

    /// Invalid method parameter(s)
    pub const INVALID_PARAMS: i64 = -32602;

    /// Internal JSON-RPC error
    pub const INTERNAL_ERROR: i64 = -32603;

    // Media-server specific error codes

    /// Referenced object does not exist (or was released)
    pub const OBJECT_NOT_FOUND: i64 = -32000;

    /// Requested object type is not registered on the server
    pub const INVALID_OBJECT_TYPE: i64 = -32001;

    /// Referenced subscription does not exist
    pub const SUBSCRIPTION_NOT_FOUND: i64 = -32002;

    /// Operation not supported by the referenced object
    pub const OPERATION_NOT_SUPPORTED: i64 = -32003;
}

/// Parameters of the `create` request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateParams {
    /// Remote object type name
    #[serde(rename = "type")]
    pub object_type: String,

    /// Constructor parameters of the type
    pub constructor_params: Value,

    /// Containing object (absent for top-level containers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// Parameters of the `invoke` request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvokeParams {
    /// Target object id
    pub object: String,

    /// Operation name
    pub operation: String,

    /// Operation parameters
    pub operation_params: Value,
}

/// Parameters of the `subscribe` / `unsubscribe` requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeParams {
    /// Target object id
    pub object: String,

    /// Event type name to (un)subscribe
    #[serde(rename = "type")]
    pub event_type: String,

    /// Subscription id (unsubscribe only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
}

/// Parameters of the `release` request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseParams {
    /// Target object id
    pub object: String,
}

/// Parameters of the `onEvent` server notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventNotification {
    /// Source object id
    pub object: String,

    /// Event type name
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event payload
    pub data: Value,

    /// Subscription the event belongs to
    pub subscription: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_round_trip() {
        let req = JsonRpcRequest::new(
            "create",
            json!({ "type": "MediaPipeline", "constructorParams": {} }),
            "req-1",
        );
        let text = req.to_json().unwrap();
        let back = JsonRpcRequest::from_json(&text).unwrap();
        assert_eq!(back, req);
        assert_eq!(back.jsonrpc, JSONRPC_VERSION);
    }

    #[test]
    fn test_notification_has_no_id() {
        let note = JsonRpcRequest::notification("onEvent", json!({}));
        let text = note.to_json().unwrap();
        assert!(!text.contains("\"id\""));
    }

    #[test]
    fn test_create_params_wire_names() {
        let params = CreateParams {
            object_type: "ZBarFilter".to_string(),
            constructor_params: json!({}),
            parent: Some("pipeline-1".to_string()),
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["type"], "ZBarFilter");
        assert!(value.get("constructorParams").is_some());
        assert_eq!(value["parent"], "pipeline-1");
    }

    #[test]
    fn test_event_notification_parse() {
        let raw = json!({
            "object": "zbar-1",
            "type": "CodeFound",
            "data": { "codeType": "QR-Code", "value": "hello" },
            "subscription": "sub-1"
        });
        let note: EventNotification = serde_json::from_value(raw).unwrap();
        assert_eq!(note.event_type, "CodeFound");
        assert_eq!(note.subscription, "sub-1");
    }

    #[test]
    fn test_error_object_round_trip() {
        let err = JsonRpcError::new(
            error_codes::OBJECT_NOT_FOUND,
            "no such object",
            json!("req-9"),
        );
        let text = err.to_json().unwrap();
        let back: JsonRpcError = serde_json::from_str(&text).unwrap();
        assert_eq!(back.error.code, error_codes::OBJECT_NOT_FOUND);
        assert_eq!(back.error.message, "no such object");
    }
}
