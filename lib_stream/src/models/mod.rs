//! # Stream Data Models
//!
//! Wire and domain types shared by every part of the streaming client.
//!
//! ## Contained Modules:
//!
//! - **`identity`**: The client identity, the subscription set declared at
//!   construction, and the one-shot `ConnectionTicket` handed out by the gateway.
//! - **`envelope`**: Inbound and outbound stream frames, the message type
//!   enums, and the `ConnectionState` flag owned by the supervisor.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Client identity, subscriptions and connection tickets.
pub mod identity;
/// Inbound/outbound frames and message classification types.
pub mod envelope;

pub use envelope::{
    BusinessType, ConnectionState, EnvelopeHeaders, InboundEnvelope, MessageType,
    OutboundEnvelope, OutboundHeaders,
};
pub use identity::{ClientIdentity, ConnectionTicket, Subscription};
