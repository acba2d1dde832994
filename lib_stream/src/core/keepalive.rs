//! # Keepalive Responder
//!
//! Answers `SYSTEM` / `ping` probes. The reply echoes the probe's `messageId`
//! and its `data` unchanged, which is what the server checks for liveness.

use chrono::{DateTime, Utc};

use crate::models::envelope::{InboundEnvelope, OutboundEnvelope};

/// Builds ping acknowledgments and remembers when the last probe arrived.
#[derive(Debug, Default)]
pub struct KeepaliveResponder {
    last_ping_at: Option<DateTime<Utc>>,
}

impl KeepaliveResponder {
    /// Creates a responder that has not seen a probe yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the probe and returns the acknowledgment to send.
    pub fn respond(&mut self, ping: &InboundEnvelope) -> OutboundEnvelope {
        self.last_ping_at = Some(Utc::now());
        log::trace!("Keepalive probe {}", ping.headers.message_id);
        OutboundEnvelope::ok(ping.headers.message_id.clone(), ping.data.clone())
    }

    /// When the last probe was observed. Diagnostic only.
    pub fn last_ping_at(&self) -> Option<DateTime<Utc>> {
        self.last_ping_at
    }
}
