//! # lib_stream
//!
//! A client for a long-lived, gateway-ticketed event stream. It trades an
//! application identity for a one-time ticket over HTTP, holds a WebSocket open
//! on the ticketed endpoint, answers keepalive probes, hands business messages
//! to registered handlers, and starts over with fresh credentials whenever the
//! server asks it to.
//!
//! ```no_run
//! use lib_stream::{BusinessType, ClientIdentity, StreamClient, StreamConfig};
//!
//! # async fn run() -> lib_stream::Result<()> {
//! let config = StreamConfig::new(ClientIdentity::new("app-key", "app-secret"));
//! let mut client = StreamClient::new(config)?;
//! client.register_handler(BusinessType::Event, |msg| {
//!     log::info!("event {:?}", msg.message_id());
//!     Ok(serde_json::json!({"status": "SUCCESS"}))
//! });
//! client.connect().await
//! # }
//! ```

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod configs;
pub mod core;
pub mod errors;
pub mod models;
pub mod retrieve;
pub mod transport;

pub use configs::{StreamConfig, DEFAULT_GATEWAY_URL};
pub use crate::core::{
    ConnectionSupervisor, DropReason, NoopObserver, ReconnectPolicy, ReconnectReason,
    StreamClient, StreamObserver,
};
pub use errors::{Result, StreamError};
pub use models::{
    BusinessType, ClientIdentity, ConnectionState, ConnectionTicket, InboundEnvelope,
    MessageType, OutboundEnvelope, Subscription,
};
pub use retrieve::{CredentialExchanger, HttpCredentialExchanger, OpenConnectionRequest};
pub use transport::{Frame, StreamConnection, StreamTransport, WsTransport};
