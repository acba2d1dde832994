//! # Client Configuration
//!
//! Library-level configuration for a streaming session. Process bootstrap
//! (files, environment, CLI flags) lives in the binary and only hands a finished
//! `StreamConfig` to the client.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use local_ip_address::local_ip;
use url::Url;

use crate::core::backoff::ReconnectPolicy;
use crate::errors::{Result, StreamError};
use crate::models::identity::{ClientIdentity, Subscription};

/// Gateway endpoint that exchanges credentials for a connection ticket.
pub const DEFAULT_GATEWAY_URL: &str = "https://api.dingtalk.com/v1.0/gateway/connections/open";

/// User agent reported to the gateway when none is configured.
pub fn default_user_agent() -> String {
    format!("lib-stream-rs/{}", env!("CARGO_PKG_VERSION"))
}

/// Best-effort lookup of this host's primary local IP address.
pub fn detect_local_ip() -> Option<String> {
    match local_ip() {
        Ok(ip) => Some(ip.to_string()),
        Err(e) => {
            log::warn!("Could not determine local IP address: {}", e);
            None
        }
    }
}

/// # Stream Config
///
/// Everything the supervisor needs to run a session. Immutable once
/// `connect()` starts.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Application credentials.
    pub identity: ClientIdentity,
    /// Subscriptions sent verbatim on every credential request.
    pub subscriptions: Vec<Subscription>,
    /// `ua` field of the credential request.
    pub user_agent: String,
    /// `localIp` field of the credential request, omitted when `None`.
    pub local_ip: Option<String>,
    /// Credential exchange endpoint.
    pub gateway_url: String,
    /// Delay applied between forced reconnects.
    pub reconnect: ReconnectPolicy,
    /// Log and drop handler failures instead of ending `connect()`.
    pub isolate_handler_failures: bool,
}

impl StreamConfig {
    /// A configuration with the default subscription set, user agent and
    /// gateway, immediate reconnects and no handler isolation.
    pub fn new(identity: ClientIdentity) -> Self {
        Self {
            identity,
            subscriptions: Subscription::default_set(),
            user_agent: default_user_agent(),
            local_ip: None,
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            reconnect: ReconnectPolicy::Immediate,
            isolate_handler_failures: false,
        }
    }

    /// Replaces the subscription set.
    pub fn with_subscriptions(mut self, subscriptions: Vec<Subscription>) -> Self {
        self.subscriptions = subscriptions;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the local IP reported to the gateway.
    pub fn with_local_ip(mut self, local_ip: Option<String>) -> Self {
        self.local_ip = local_ip.filter(|ip| !ip.is_empty());
        self
    }

    /// Points the credential exchange at another gateway.
    pub fn with_gateway_url(mut self, gateway_url: impl Into<String>) -> Self {
        self.gateway_url = gateway_url.into();
        self
    }

    /// Sets the reconnect policy.
    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Enables or disables handler failure isolation.
    pub fn with_handler_isolation(mut self, isolate: bool) -> Self {
        self.isolate_handler_failures = isolate;
        self
    }

    /// Rejects configurations the gateway would refuse anyway.
    pub fn validate(&self) -> Result<()> {
        if self.identity.id.trim().is_empty() {
            return Err(StreamError::InvalidConfig("client id is empty".to_string()));
        }
        if self.identity.secret.trim().is_empty() {
            return Err(StreamError::InvalidConfig("client secret is empty".to_string()));
        }
        if self.subscriptions.is_empty() {
            return Err(StreamError::InvalidConfig(
                "at least one subscription is required".to_string(),
            ));
        }
        Url::parse(&self.gateway_url).map_err(|e| {
            StreamError::InvalidConfig(format!("gateway url '{}': {}", self.gateway_url, e))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::envelope::MessageType;

    #[test]
    fn test_defaults() {
        let config = StreamConfig::new(ClientIdentity::new("id", "secret"));
        assert_eq!(config.subscriptions, vec![Subscription::new(MessageType::Event, "*")]);
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert!(config.user_agent.starts_with("lib-stream-rs/"));
        assert_eq!(config.reconnect, ReconnectPolicy::Immediate);
        assert!(!config.isolate_handler_failures);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_credentials_and_subscriptions() {
        assert!(StreamConfig::new(ClientIdentity::new("", "s")).validate().is_err());
        assert!(StreamConfig::new(ClientIdentity::new("i", " ")).validate().is_err());
        assert!(StreamConfig::new(ClientIdentity::new("i", "s"))
            .with_subscriptions(Vec::new())
            .validate()
            .is_err());
        assert!(StreamConfig::new(ClientIdentity::new("i", "s"))
            .with_gateway_url("gateway")
            .validate()
            .is_err());
    }

    #[test]
    fn test_empty_local_ip_is_omitted() {
        let config = StreamConfig::new(ClientIdentity::new("i", "s")).with_local_ip(Some(String::new()));
        assert_eq!(config.local_ip, None);
    }
}
