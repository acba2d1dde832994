//! # Stream Client Errors
//!
//! The failure taxonomy surfaced by the streaming client. Only conditions that
//! end a connect attempt or a session are represented here; frames that are
//! dropped locally (undecodable, unroutable, no handler) are reported as a
//! [`DropReason`](crate::core::observer::DropReason) instead.

use thiserror::Error;

use crate::models::envelope::BusinessType;

#[derive(Debug, Error)]
/// # Stream Error
///
/// Errors produced by the credential exchange, the stream transport, the
/// application handlers and the configuration layer.
pub enum StreamError {
    /// The gateway did not hand out a usable endpoint and ticket. Fatal for `connect()`.
    #[error("Credential exchange failed: {0}")]
    CredentialExchangeFailed(String),

    /// Open, send or receive failed on the stream connection.
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// A registered handler returned an error.
    #[error("Handler for {kind} failed: {source}")]
    HandlerFailure {
        /// The business message type the failing handler was registered for.
        kind: BusinessType,
        /// The error returned by the application.
        #[source]
        source: anyhow::Error,
    },

    /// An outbound envelope could not be encoded.
    #[error("JSON encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// The client configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for StreamError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        StreamError::TransportFailure(e.to_string())
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, StreamError>;
