//! # Stream Envelopes
//!
//! One decoded unit of the stream protocol is an *envelope*. Inbound envelopes
//! arrive as JSON text frames and are either system control messages (`SYSTEM`)
//! or business messages (`EVENT`, `CALLBACK`). Outbound envelopes are the replies
//! the client writes back, always carrying the `messageId` of the frame that
//! triggered them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{Result, StreamError};

/// Content type stamped on every outbound envelope.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Top-level `type` of a stream envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// Control traffic: keepalive probes and disconnect instructions.
    System,
    /// Business event push.
    Event,
    /// Business callback awaiting an application answer.
    Callback,
}

impl MessageType {
    /// The wire spelling of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::System => "SYSTEM",
            MessageType::Event => "EVENT",
            MessageType::Callback => "CALLBACK",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SYSTEM" => Ok(MessageType::System),
            "EVENT" => Ok(MessageType::Event),
            "CALLBACK" => Ok(MessageType::Callback),
            other => Err(StreamError::InvalidConfig(format!(
                "unknown message type '{}' (expected SYSTEM, EVENT or CALLBACK)",
                other
            ))),
        }
    }
}

/// The message types a caller may register a handler for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessType {
    /// Handler for `EVENT` envelopes.
    Event,
    /// Handler for `CALLBACK` envelopes.
    Callback,
}

impl From<BusinessType> for MessageType {
    fn from(kind: BusinessType) -> Self {
        match kind {
            BusinessType::Event => MessageType::Event,
            BusinessType::Callback => MessageType::Callback,
        }
    }
}

impl TryFrom<MessageType> for BusinessType {
    type Error = StreamError;

    fn try_from(kind: MessageType) -> Result<Self> {
        match kind {
            MessageType::Event => Ok(BusinessType::Event),
            MessageType::Callback => Ok(BusinessType::Callback),
            MessageType::System => Err(StreamError::InvalidConfig(
                "SYSTEM messages are handled by the client itself".to_string(),
            )),
        }
    }
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        MessageType::from(*self).fmt(f)
    }
}

impl FromStr for BusinessType {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self> {
        MessageType::from_str(s)?.try_into()
    }
}

/// Headers of an inbound envelope. Fields the client does not interpret
/// (`time`, `eventType`, `eventCorpId`, ...) are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeHeaders {
    /// Routing topic, e.g. `ping`, `disconnect` or a business topic.
    pub topic: Option<String>,
    /// Correlation id, echoed in the reply exactly as received.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub message_id: Value,
    /// Content type of `data`.
    pub content_type: Option<String>,
    /// Any other header sent by the server.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Value> for EnvelopeHeaders {
    /// Anything but an object yields empty headers.
    fn from(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };
        Self {
            topic: map.remove("topic").and_then(into_text),
            message_id: map.remove("messageId").unwrap_or(Value::Null),
            content_type: map.remove("contentType").and_then(into_text),
            extra: map,
        }
    }
}

/// A decoded inbound frame.
///
/// Decoding never fails once the frame is valid JSON: routing only looks at
/// the `type` string and `headers.topic`, and fields of an unexpected shape
/// are left empty instead of rejecting the whole frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct InboundEnvelope {
    /// Protocol version announced by the server.
    pub spec_version: Option<String>,
    /// Raw `type` field, empty when absent or not a string.
    #[serde(rename = "type")]
    pub kind: String,
    /// Envelope headers.
    pub headers: EnvelopeHeaders,
    /// Opaque payload.
    pub data: Value,
}

impl From<Value> for InboundEnvelope {
    fn from(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };
        Self {
            spec_version: map.remove("specVersion").and_then(into_text),
            kind: match map.remove("type") {
                Some(Value::String(kind)) => kind,
                _ => String::new(),
            },
            headers: map.remove("headers").map(EnvelopeHeaders::from).unwrap_or_default(),
            data: map.remove("data").unwrap_or(Value::Null),
        }
    }
}

/// Strings as-is, numbers and booleans in their JSON spelling.
fn into_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl InboundEnvelope {
    /// The parsed `type`, if it is one of the known message types.
    pub fn message_type(&self) -> Option<MessageType> {
        self.kind.parse().ok()
    }

    /// The `headers.topic` value, or an empty string when absent.
    pub fn topic(&self) -> &str {
        self.headers.topic.as_deref().unwrap_or_default()
    }

    /// The `headers.messageId` value, when it is a string.
    pub fn message_id(&self) -> Option<&str> {
        self.headers.message_id.as_str()
    }

    /// Looks up a header the client does not model explicitly.
    pub fn header(&self, name: &str) -> Option<&Value> {
        self.headers.extra.get(name)
    }

    /// `headers.time` in milliseconds. The server sends it either as a JSON
    /// number or as a numeric string.
    pub fn time_millis(&self) -> Option<i64> {
        match self.header("time")? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Headers of an outbound reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundHeaders {
    /// Always `application/json`.
    pub content_type: String,
    /// The `messageId` of the envelope being answered, `null` when it had none.
    pub message_id: Value,
}

/// A reply frame written back on the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEnvelope {
    /// Status code, `200` for every reply the client produces.
    pub code: u16,
    /// Reply headers.
    pub headers: OutboundHeaders,
    /// Status text, `OK` for every reply the client produces.
    pub message: String,
    /// Reply payload.
    pub data: Value,
}

impl OutboundEnvelope {
    /// A `200 OK` reply correlated to `message_id`.
    pub fn ok(message_id: Value, data: Value) -> Self {
        Self {
            code: 200,
            headers: OutboundHeaders {
                content_type: CONTENT_TYPE_JSON.to_string(),
                message_id,
            },
            message: "OK".to_string(),
            data,
        }
    }

    /// The correlation id carried by this reply.
    pub fn message_id(&self) -> &Value {
        &self.headers.message_id
    }

    /// Encodes the reply as a JSON text frame.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Connection flag owned by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No usable stream connection.
    #[default]
    Disconnected,
    /// A stream connection is open and the receive loop may dispatch.
    Connected,
}
