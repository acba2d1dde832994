//! # Handler Dispatcher
//!
//! Invokes the registered handler for a business envelope and packages the
//! result into a reply correlated to the envelope's `messageId`.
//!
//! The handler result travels as a JSON *string* in the reply's `data` field:
//! a handler returning `{"status":"SUCCESS"}` produces
//! `"data": "{\"status\":\"SUCCESS\"}"`, which is what the gateway expects for
//! business acknowledgments.

use serde_json::Value;

use crate::core::registry::HandlerRegistry;
use crate::errors::{Result, StreamError};
use crate::models::envelope::{BusinessType, InboundEnvelope, OutboundEnvelope};

/// Runs the handler for `kind` synchronously.
///
/// Returns `Ok(None)` when no handler is registered: the envelope is dropped
/// and the server receives no reply. A failing handler surfaces as
/// [`StreamError::HandlerFailure`].
pub fn dispatch(
    kind: BusinessType,
    envelope: &InboundEnvelope,
    registry: &HandlerRegistry,
) -> Result<Option<OutboundEnvelope>> {
    let Some(handler) = registry.get(kind) else {
        return Ok(None);
    };

    let result = handler(envelope).map_err(|source| StreamError::HandlerFailure { kind, source })?;
    let data = Value::String(serde_json::to_string(&result)?);

    Ok(Some(OutboundEnvelope::ok(
        envelope.headers.message_id.clone(),
        data,
    )))
}
