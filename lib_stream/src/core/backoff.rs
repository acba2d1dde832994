//! # Reconnect Policy
//!
//! How long the supervisor waits before restarting the lifecycle after a
//! forced reconnect. The default reconnects immediately and without limit;
//! exponential backoff has to be asked for explicitly.

use std::time::Duration;

/// Delay strategy between forced reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectPolicy {
    /// Restart right away. A server that keeps sending `disconnect` produces a
    /// tight reconnect loop.
    #[default]
    Immediate,
    /// `base * 2^n` for the n-th consecutive reconnect, capped at `max`.
    Exponential {
        /// Delay before the first reconnect.
        base: Duration,
        /// Upper bound for any single delay.
        max: Duration,
    },
}

impl ReconnectPolicy {
    /// Builds an exponential policy from millisecond settings. A zero base
    /// means no backoff.
    pub fn from_millis(base_ms: u64, max_ms: u64) -> Self {
        if base_ms == 0 {
            return ReconnectPolicy::Immediate;
        }
        ReconnectPolicy::Exponential {
            base: Duration::from_millis(base_ms),
            max: Duration::from_millis(max_ms.max(base_ms)),
        }
    }

    /// Delay before reconnect number `consecutive` (0-based) since the last
    /// session that carried traffic.
    pub fn delay(&self, consecutive: u32) -> Duration {
        match *self {
            ReconnectPolicy::Immediate => Duration::ZERO,
            ReconnectPolicy::Exponential { base, max } => {
                let factor = 1u32.checked_shl(consecutive.min(31)).unwrap_or(u32::MAX);
                base.checked_mul(factor).map_or(max, |d| d.min(max))
            }
        }
    }
}
