//! # Message Classifier
//!
//! Decodes raw text frames into [`InboundEnvelope`]s and decides where each one
//! goes. Frames that are not JSON, or decode to an empty value (`null`, `false`,
//! `0`, `""`, `"0"`, `[]`, `{}`), are discarded without error. Everything else
//! decodes, and routing looks only at the `type` string and `headers.topic`.

use serde_json::Value;

use crate::models::envelope::{BusinessType, InboundEnvelope, MessageType};

/// `headers.topic` of a keepalive probe.
pub const TOPIC_PING: &str = "ping";
/// `headers.topic` of a server disconnect instruction.
pub const TOPIC_DISCONNECT: &str = "disconnect";

/// Destination of a decoded envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `SYSTEM` / `ping`: answer with a keepalive acknowledgment.
    Ping,
    /// `SYSTEM` / `disconnect`: close the transport and reconnect.
    Disconnect,
    /// `EVENT` or `CALLBACK`: hand to the registered handler.
    Business(BusinessType),
    /// Any other type/topic combination.
    Unroutable,
}

/// Decodes a frame. `None` means the frame is dropped.
pub fn classify(raw: &str) -> Option<InboundEnvelope> {
    let value: Value = serde_json::from_str(raw).ok()?;
    if is_empty_value(&value) {
        return None;
    }
    Some(InboundEnvelope::from(value))
}

/// Routes a decoded envelope by `type` and, for system messages, by topic.
pub fn route(envelope: &InboundEnvelope) -> Route {
    match envelope.message_type() {
        Some(MessageType::System) => match envelope.topic() {
            TOPIC_PING => Route::Ping,
            TOPIC_DISCONNECT => Route::Disconnect,
            _ => Route::Unroutable,
        },
        Some(MessageType::Event) => Route::Business(BusinessType::Event),
        Some(MessageType::Callback) => Route::Business(BusinessType::Callback),
        None => Route::Unroutable,
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_frames_are_discarded() {
        for raw in ["", "   ", "not json", "{\"type\":", "null", "false", "0", "\"\"", "[]", "{}"] {
            assert!(classify(raw).is_none(), "frame {:?} should be discarded", raw);
        }
    }

    #[test]
    fn test_non_object_values_are_unroutable() {
        for raw in ["42", "\"hello\"", "[1,2]", "true"] {
            let envelope = classify(raw).expect("non-empty JSON decodes");
            assert_eq!(route(&envelope), Route::Unroutable, "frame {}", raw);
        }
    }

    #[test]
    fn test_unexpected_field_types_still_route() {
        let cases = [
            (
                r#"{"specVersion":1.0,"type":"EVENT","headers":{"topic":"dingTalk","messageId":"m1"},"data":"{}"}"#,
                Route::Business(BusinessType::Event),
            ),
            (
                r#"{"type":"EVENT","headers":{"topic":"dingTalk","messageId":"m2","contentType":5},"data":"{}"}"#,
                Route::Business(BusinessType::Event),
            ),
            (
                r#"{"type":"CALLBACK","headers":null,"data":"{}"}"#,
                Route::Business(BusinessType::Callback),
            ),
            (
                r#"{"type":"SYSTEM","headers":{"topic":"ping","messageId":12345},"data":{}}"#,
                Route::Ping,
            ),
            (r#"{"type":["EVENT"],"headers":{"topic":"dingTalk"}}"#, Route::Unroutable),
            (r#"{"type":"SYSTEM","headers":"ping"}"#, Route::Unroutable),
        ];

        for (raw, expected) in cases {
            let envelope = classify(raw).expect("frame should decode");
            assert_eq!(route(&envelope), expected, "frame {}", raw);
        }
    }

    #[test]
    fn test_routing_table() {
        let cases = [
            (r#"{"type":"SYSTEM","headers":{"topic":"ping","messageId":"m1"}}"#, Route::Ping),
            (r#"{"type":"SYSTEM","headers":{"topic":"disconnect"}}"#, Route::Disconnect),
            (r#"{"type":"SYSTEM","headers":{"topic":"KEEPALIVE"}}"#, Route::Unroutable),
            (r#"{"type":"SYSTEM"}"#, Route::Unroutable),
            (r#"{"type":"EVENT","headers":{"topic":"dingTalk"}}"#, Route::Business(BusinessType::Event)),
            (r#"{"type":"CALLBACK","headers":{"topic":"/v1.0/im/bot/messages/get"}}"#, Route::Business(BusinessType::Callback)),
            (r#"{"type":"event","headers":{"topic":"ping"}}"#, Route::Unroutable),
            (r#"{"headers":{"topic":"ping"}}"#, Route::Unroutable),
        ];

        for (raw, expected) in cases {
            let envelope = classify(raw).expect("frame should decode");
            assert_eq!(route(&envelope), expected, "frame {}", raw);
        }
    }
}
