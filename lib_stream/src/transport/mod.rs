//! # Stream Transport
//!
//! The full-duplex, message-oriented connection the supervisor drives. The
//! supervisor only sees the [`StreamTransport`] and [`StreamConnection`] traits,
//! so tests can script a session without a network.
//!
//! ## Contained Modules:
//!
//! - **`websocket`**: The production transport, a `tokio-tungstenite` client
//!   connection to the ticketed endpoint.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use async_trait::async_trait;
use url::Url;

use crate::errors::Result;

/// WebSocket implementation of the transport traits.
pub mod websocket;

pub use websocket::{WsConnection, WsTransport};

/// One result of a blocking receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text frame to classify.
    Text(String),
    /// Nothing to classify (control frame, unreadable binary). Keep polling.
    Empty,
}

/// Opens stream connections.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// The connection type this transport produces.
    type Connection: StreamConnection;

    /// Connects to `url` (endpoint with the ticket already appended).
    async fn open(&self, url: &Url) -> Result<Self::Connection>;
}

/// An open stream connection.
#[async_trait]
pub trait StreamConnection: Send {
    /// Writes one text frame.
    async fn send(&mut self, text: String) -> Result<()>;

    /// Waits for the next frame. An error means the connection is unusable.
    async fn receive(&mut self) -> Result<Frame>;

    /// Closes the connection. Closing an already closed connection is not an error.
    async fn close(&mut self) -> Result<()>;
}
