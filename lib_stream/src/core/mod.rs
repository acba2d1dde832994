//! # Stream Engine Module
//!
//! The connection lifecycle and everything it drives once a stream is open.
//!
//! ## Core Components:
//!
//! - **`supervisor`**: Owns the connection flag and runs the
//!   credentials → connect → receive loop → reconnect cycle iteratively.
//!
//! - **`classifier`**: Decodes raw frames and routes them to the keepalive
//!   responder, the disconnect path, or a business handler.
//!
//! - **`keepalive`**: Echoes `SYSTEM`/`ping` probes.
//!
//! - **`registry`** and **`dispatcher`**: One handler per business type and the
//!   invocation that turns its result into a correlated reply.
//!
//! - **`backoff`**: The optional delay between forced reconnects.
//!
//! - **`observer`**: A hook for dropped frames, replies and reconnects.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Reconnect delay policy.
pub mod backoff;
/// Frame decoding and routing.
pub mod classifier;
/// Handler invocation and reply construction.
pub mod dispatcher;
/// Ping echo and liveness bookkeeping.
pub mod keepalive;
/// Observability callbacks.
pub mod observer;
/// Business handler table.
pub mod registry;
/// The connection lifecycle state machine.
pub mod supervisor;

pub use backoff::ReconnectPolicy;
pub use classifier::Route;
pub use observer::{DropReason, NoopObserver, ReconnectReason, StreamObserver};
pub use registry::HandlerRegistry;
pub use supervisor::{ConnectionSupervisor, StreamClient};
