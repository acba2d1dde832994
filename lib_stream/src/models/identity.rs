//! # Identity, Subscriptions and Tickets
//!
//! The immutable client identity, the subscription set sent on every credential
//! request, and the short-lived ticket the gateway exchanges them for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{Result, StreamError};
use crate::models::envelope::MessageType;

/// Application credentials issued by the gateway operator.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    /// Application key.
    pub id: String,
    /// Application secret.
    pub secret: String,
}

impl ClientIdentity {
    /// Creates an identity from an application key and secret.
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("id", &self.id)
            .field("secret", &"*****")
            .finish()
    }
}

/// One `{type, topic}` pair the client asks the gateway to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscription {
    /// Message type.
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Topic filter, `*` for everything.
    pub topic: String,
}

impl Subscription {
    /// Creates a subscription.
    pub fn new(kind: MessageType, topic: impl Into<String>) -> Self {
        Self {
            kind,
            topic: topic.into(),
        }
    }

    /// The subscription set used when the caller declares none: every `EVENT`.
    pub fn default_set() -> Vec<Subscription> {
        vec![Subscription::new(MessageType::Event, "*")]
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.topic)
    }
}

/// Parses `TYPE:TOPIC`, e.g. `EVENT:*` or `CALLBACK:/v1.0/im/bot/messages/get`.
impl FromStr for Subscription {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, topic) = s.split_once(':').ok_or_else(|| {
            StreamError::InvalidConfig(format!("subscription '{}' is not TYPE:TOPIC", s))
        })?;
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(StreamError::InvalidConfig(format!(
                "subscription '{}' has an empty topic",
                s
            )));
        }
        Ok(Subscription::new(kind.trim().to_uppercase().parse()?, topic))
    }
}

/// Endpoint and ticket returned by the gateway. Good for exactly one connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionTicket {
    /// WebSocket endpoint to connect to.
    pub endpoint: String,
    /// Opaque one-time token.
    pub ticket: String,
}

impl ConnectionTicket {
    /// Creates a ticket.
    pub fn new(endpoint: impl Into<String>, ticket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ticket: ticket.into(),
        }
    }

    /// Consumes the ticket and builds the stream URL: the endpoint with the
    /// ticket appended as the `ticket` query parameter.
    pub fn into_stream_url(self) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| {
            StreamError::TransportFailure(format!("invalid endpoint '{}': {}", self.endpoint, e))
        })?;
        url.query_pairs_mut().append_pair("ticket", &self.ticket);
        Ok(url)
    }
}

impl fmt::Debug for ConnectionTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionTicket")
            .field("endpoint", &self.endpoint)
            .field("ticket", &"*****")
            .finish()
    }
}
