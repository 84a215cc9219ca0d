//! Request and response objects carried inside frames.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BridgeError, ProtocolErrorKind};

/// `type` of the liveness probe.
pub const PING: &str = "ping";

/// `type` of the liveness reply.
pub const PONG: &str = "pong";

/// A request from the extension.
///
/// Only the `type` field is interpreted; everything else is passed through
/// to the helper untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Request {
    fields: Map<String, Value>,
}

impl Request {
    /// Parse a request from a raw frame payload.
    ///
    /// Anything other than a JSON object is rejected.
    pub fn parse(payload: &[u8]) -> Result<Self, BridgeError> {
        serde_json::from_slice(payload).map_err(|e| BridgeError::Protocol {
            kind: ProtocolErrorKind::InvalidMessageFormat {
                message: e.to_string(),
            },
        })
    }

    /// The request `type`, if present and a string.
    pub fn kind(&self) -> Option<&str> {
        self.fields.get("type").and_then(Value::as_str)
    }

    /// Whether this is a liveness probe.
    pub fn is_ping(&self) -> bool {
        self.kind() == Some(PING)
    }

    pub fn into_object(self) -> Map<String, Value> {
        self.fields
    }
}

/// A response to the extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Response {
    fields: Map<String, Value>,
}

impl Response {
    /// The liveness reply, `{"type":"pong"}`.
    pub fn pong() -> Self {
        let mut fields = Map::new();
        fields.insert("type".to_string(), Value::from(PONG));
        Self { fields }
    }

    /// An error reply, `{"type":"error","message":...}`.
    pub fn error(message: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("type".to_string(), Value::from("error"));
        fields.insert("message".to_string(), Value::from(message.into()));
        Self { fields }
    }

    /// Wrap an object produced elsewhere (the helper, or an echoed request).
    pub fn from_object(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Parse a response object from raw bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn kind(&self) -> Option<&str> {
        self.fields.get("type").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Serialize to the bytes that go inside a frame.
    pub fn to_bytes(&self) -> Result<Vec<u8>, BridgeError> {
        Ok(serde_json::to_vec(&self.fields)?)
    }
}

impl From<Request> for Response {
    fn from(request: Request) -> Self {
        Self::from_object(request.into_object())
    }
}
