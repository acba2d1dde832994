//! # Observability Hook
//!
//! Dropped frames and reconnects never change control flow, but callers may
//! want to count or log them. Implement [`StreamObserver`] and pass it to the
//! supervisor; every method defaults to doing nothing.

use crate::errors::StreamError;
use crate::models::envelope::{BusinessType, ConnectionState, OutboundEnvelope};

/// Why a received frame produced no reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Not JSON, or decoded to an empty value.
    MessageDecodeFailed,
    /// Decoded, but the type/topic combination has no route.
    UnroutableMessage {
        /// Raw `type` field.
        kind: String,
        /// `headers.topic`.
        topic: String,
    },
    /// Business message of a type nobody registered a handler for.
    NoHandlerRegistered(BusinessType),
    /// The handler failed and handler isolation is enabled.
    HandlerFailed(BusinessType),
}

/// Why the supervisor restarted the lifecycle.
#[derive(Debug)]
pub enum ReconnectReason {
    /// The server sent `SYSTEM` / `disconnect`.
    ServerDisconnect,
    /// Open, send or receive failed, or the peer went away.
    TransportFailure(StreamError),
}

/// Receives lifecycle and drop notifications from the supervisor.
pub trait StreamObserver: Send + Sync {
    /// The connection flag changed.
    fn on_state_change(&self, _state: ConnectionState) {}

    /// A frame was dropped without a reply.
    fn on_dropped(&self, _reason: &DropReason) {}

    /// A reply was written to the stream.
    fn on_reply(&self, _reply: &OutboundEnvelope) {}

    /// A session ended and the lifecycle is about to restart.
    fn on_reconnect(&self, _reason: &ReconnectReason) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StreamObserver for NoopObserver {}
