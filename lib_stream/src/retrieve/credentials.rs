//! # Credential Exchanger
//!
//! Trades the client identity and subscription set for a one-time stream
//! endpoint and ticket. One POST per call, no retry: any failure is a
//! [`StreamError::CredentialExchangeFailed`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use url::{Host, Url};

use crate::configs::StreamConfig;
use crate::errors::{Result, StreamError};
use crate::models::identity::{ClientIdentity, ConnectionTicket, Subscription};
use crate::retrieve::gateway_http::{ApiClient, DEFAULT_TIMEOUT};

/// JSON body of the credential request.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenConnectionRequest {
    /// Application key.
    pub client_id: String,
    /// Application secret.
    pub client_secret: String,
    /// Subscriptions, sent verbatim.
    pub subscriptions: Vec<Subscription>,
    /// Client user agent.
    pub ua: String,
    /// Local IP of the client host, omitted when unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_ip: Option<String>,
}

impl OpenConnectionRequest {
    /// Builds the request body.
    pub fn new(
        identity: &ClientIdentity,
        subscriptions: &[Subscription],
        user_agent: &str,
        local_ip: Option<&str>,
    ) -> Self {
        Self {
            client_id: identity.id.clone(),
            client_secret: identity.secret.clone(),
            subscriptions: subscriptions.to_vec(),
            ua: user_agent.to_string(),
            local_ip: local_ip.filter(|ip| !ip.is_empty()).map(str::to_string),
        }
    }

    /// Builds the request body from a session configuration.
    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(
            &config.identity,
            &config.subscriptions,
            &config.user_agent,
            config.local_ip.as_deref(),
        )
    }
}

impl fmt::Debug for OpenConnectionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenConnectionRequest")
            .field("client_id", &self.client_id)
            .field("client_secret", &"*****")
            .field("subscriptions", &self.subscriptions)
            .field("ua", &self.ua)
            .field("local_ip", &self.local_ip)
            .finish()
    }
}

/// Source of connection tickets.
#[async_trait]
pub trait CredentialExchanger: Send + Sync {
    /// Exchanges the request for a fresh ticket.
    async fn fetch(&self, request: &OpenConnectionRequest) -> Result<ConnectionTicket>;
}

/// Extracts the ticket from a gateway answer. Only non-empty string
/// `endpoint` and `ticket` fields are accepted; everything else is ignored.
pub fn ticket_from_response(body: &Value) -> Result<ConnectionTicket> {
    let field = |name: &str| {
        body.get(name)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
    };

    match (field("endpoint"), field("ticket")) {
        (Some(endpoint), Some(ticket)) => Ok(ConnectionTicket::new(endpoint, ticket)),
        (endpoint, ticket) => Err(StreamError::CredentialExchangeFailed(format!(
            "gateway response lacks {}",
            match (endpoint, ticket) {
                (None, None) => "endpoint and ticket",
                (None, _) => "endpoint",
                _ => "ticket",
            }
        ))),
    }
}

/// Loopback gateways (local test doubles, sidecars) are never proxied.
fn is_loopback(gateway_url: &str) -> bool {
    match Url::parse(gateway_url).ok().and_then(|u| u.host().map(|h| h.to_owned())) {
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        Some(Host::Domain(name)) => name == "localhost",
        None => false,
    }
}

/// HTTP implementation against the gateway's `connections/open` API.
#[derive(Debug, Clone)]
pub struct HttpCredentialExchanger {
    client: ApiClient,
    gateway_url: String,
}

impl HttpCredentialExchanger {
    /// Creates an exchanger posting to `gateway_url`.
    pub fn new(gateway_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        Self::with_timeout(gateway_url, user_agent, DEFAULT_TIMEOUT)
    }

    /// Same as [`HttpCredentialExchanger::new`] with an explicit request timeout.
    pub fn with_timeout(
        gateway_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let gateway_url = gateway_url.into();
        let client = ApiClient::new(user_agent, timeout, is_loopback(&gateway_url))
            .map_err(|e| StreamError::InvalidConfig(format!("{:#}", e)))?;
        Ok(Self { client, gateway_url })
    }
}

#[async_trait]
impl CredentialExchanger for HttpCredentialExchanger {
    async fn fetch(&self, request: &OpenConnectionRequest) -> Result<ConnectionTicket> {
        log::debug!("Requesting connection ticket from {}", self.gateway_url);

        let response = self
            .client
            .post_json::<Value, _>(&self.gateway_url, request)
            .await
            .map_err(|e| StreamError::CredentialExchangeFailed(format!("{:#}", e)))?;

        if !response.success {
            return Err(StreamError::CredentialExchangeFailed(format!(
                "gateway returned HTTP {}: {}",
                response.status,
                response.error_body.unwrap_or_default()
            )));
        }

        let ticket = ticket_from_response(&response.data.unwrap_or(Value::Null))?;
        log::info!("Obtained connection ticket for endpoint {}", ticket.endpoint);
        Ok(ticket)
    }
}
