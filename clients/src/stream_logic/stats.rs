use lib_stream::{ConnectionState, DropReason, OutboundEnvelope, ReconnectReason, StreamObserver};
use std::sync::atomic::{AtomicU64, Ordering};

/// Session counters, reported when the client shuts down.
#[derive(Debug, Default)]
pub struct SessionStats {
    connects: AtomicU64,
    replies: AtomicU64,
    dropped: AtomicU64,
    server_disconnects: AtomicU64,
    transport_failures: AtomicU64,
}

impl SessionStats {
    pub fn summary(&self) -> String {
        format!(
            "connects={} replies={} dropped={} server_disconnects={} transport_failures={}",
            self.connects.load(Ordering::Relaxed),
            self.replies.load(Ordering::Relaxed),
            self.dropped.load(Ordering::Relaxed),
            self.server_disconnects.load(Ordering::Relaxed),
            self.transport_failures.load(Ordering::Relaxed),
        )
    }
}

impl StreamObserver for SessionStats {
    fn on_state_change(&self, state: ConnectionState) {
        if state == ConnectionState::Connected {
            self.connects.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn on_dropped(&self, reason: &DropReason) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        if let DropReason::NoHandlerRegistered(kind) = reason {
            log::warn!("No handler registered for {} messages", kind);
        }
    }

    fn on_reply(&self, _reply: &OutboundEnvelope) {
        self.replies.fetch_add(1, Ordering::Relaxed);
    }

    fn on_reconnect(&self, reason: &ReconnectReason) {
        let counter = match reason {
            ReconnectReason::ServerDisconnect => &self.server_disconnects,
            ReconnectReason::TransportFailure(_) => &self.transport_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
