use anyhow::{Context, Result};
use clap::Parser;
use lib_stream::configs::{default_user_agent, detect_local_ip};
use lib_stream::{
    ClientIdentity, ReconnectPolicy, StreamConfig, Subscription, DEFAULT_GATEWAY_URL,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "client_stream.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "Streaming gateway client", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "STREAM_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "STREAM_CLIENT_ID", help = "Application key issued by the gateway operator.")]
    pub client_id: Option<String>,

    #[clap(long, env = "STREAM_CLIENT_SECRET", hide_env_values = true, help = "Application secret issued by the gateway operator.")]
    pub client_secret: Option<String>,

    #[clap(long, env = "STREAM_SUBSCRIPTIONS", value_delimiter = ',', help = "Subscriptions as TYPE:TOPIC, comma separated (e.g. EVENT:*).")]
    pub subscriptions: Option<Vec<String>>,

    #[clap(long, env = "STREAM_USER_AGENT", help = "User agent reported to the gateway.")]
    pub user_agent: Option<String>,

    #[clap(long, env = "STREAM_LOCAL_IP", help = "Local IP reported to the gateway.")]
    pub local_ip: Option<String>,

    #[clap(long, env = "STREAM_DETECT_LOCAL_IP", help = "Detect and report the local IP when none is given (true/false).")]
    pub detect_local_ip: Option<bool>,

    #[clap(long, env = "STREAM_GATEWAY_URL", help = "Credential exchange endpoint.")]
    pub gateway_url: Option<String>,

    #[clap(long, env = "STREAM_RECONNECT_BASE_DELAY_MS", help = "Base delay in milliseconds between reconnects. 0 reconnects immediately.")]
    pub reconnect_base_delay_ms: Option<u64>,

    #[clap(long, env = "STREAM_RECONNECT_MAX_DELAY_MS", help = "Maximum delay in milliseconds between reconnects.")]
    pub reconnect_max_delay_ms: Option<u64>,

    #[clap(long, env = "STREAM_ISOLATE_HANDLER_FAILURES", help = "Log and drop handler failures instead of exiting (true/false).")]
    pub isolate_handler_failures: Option<bool>,

    #[clap(long, env = "STREAM_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "STREAM_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error, off).")]
    pub log_level: Option<String>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            config_path: other.config_path.or(self.config_path),
            client_id: other.client_id.or(self.client_id),
            client_secret: other.client_secret.or(self.client_secret),
            subscriptions: other.subscriptions.or(self.subscriptions),
            user_agent: other.user_agent.or(self.user_agent),
            local_ip: other.local_ip.or(self.local_ip),
            detect_local_ip: other.detect_local_ip.or(self.detect_local_ip),
            gateway_url: other.gateway_url.or(self.gateway_url),
            reconnect_base_delay_ms: other.reconnect_base_delay_ms.or(self.reconnect_base_delay_ms),
            reconnect_max_delay_ms: other.reconnect_max_delay_ms.or(self.reconnect_max_delay_ms),
            isolate_handler_failures: other.isolate_handler_failures.or(self.isolate_handler_failures),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
        }
    }

    fn defaults() -> Config {
        Config {
            subscriptions: Some(vec!["EVENT:*".to_string()]),
            user_agent: Some(default_user_agent()),
            detect_local_ip: Some(false),
            gateway_url: Some(DEFAULT_GATEWAY_URL.to_string()),
            reconnect_base_delay_ms: Some(0),
            reconnect_max_delay_ms: Some(60000),
            isolate_handler_failures: Some(false),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            ..Default::default()
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Turns the merged settings into the library configuration.
    pub fn to_stream_config(&self) -> Result<StreamConfig> {
        let client_id = self
            .client_id
            .clone()
            .filter(|s| !s.is_empty())
            .context("client id is required (--client-id or STREAM_CLIENT_ID)")?;
        let client_secret = self
            .client_secret
            .clone()
            .filter(|s| !s.is_empty())
            .context("client secret is required (--client-secret or STREAM_CLIENT_SECRET)")?;

        let subscriptions = match &self.subscriptions {
            Some(items) if !items.is_empty() => items
                .iter()
                .map(|s| s.parse::<Subscription>())
                .collect::<lib_stream::Result<Vec<_>>>()?,
            _ => Subscription::default_set(),
        };

        let local_ip = match &self.local_ip {
            Some(ip) if !ip.is_empty() => Some(ip.clone()),
            _ if self.detect_local_ip.unwrap_or(false) => detect_local_ip(),
            _ => None,
        };

        let policy = ReconnectPolicy::from_millis(
            self.reconnect_base_delay_ms.unwrap_or(0),
            self.reconnect_max_delay_ms.unwrap_or(0),
        );

        let mut config = StreamConfig::new(ClientIdentity::new(client_id, client_secret))
            .with_subscriptions(subscriptions)
            .with_local_ip(local_ip)
            .with_reconnect_policy(policy)
            .with_handler_isolation(self.isolate_handler_failures.unwrap_or(false));
        if let Some(ua) = &self.user_agent {
            config = config.with_user_agent(ua.clone());
        }
        if let Some(url) = &self.gateway_url {
            config = config.with_gateway_url(url.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

fn read_config_file(path: &Path) -> Option<Config> {
    if !path.exists() {
        log::info!("Config file not found at {}. Using defaults and environment/CLI variables.", path.display());
        return None;
    }
    match fs::read_to_string(path) {
        Ok(config_str) => match serde_json::from_str::<Config>(&config_str) {
            Ok(file_config) => Some(file_config),
            Err(e) => {
                log::warn!("Failed to parse config file {}: {}. Falling back to other sources.", path.display(), e);
                None
            }
        },
        Err(e) => {
            log::warn!("Failed to read config file {}: {}. Falling back to other sources.", path.display(), e);
            None
        }
    }
}

/// Layers defaults, the JSON config file and the parsed environment/CLI values.
pub fn resolve(cli: Config) -> Config {
    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut current_config = Config::defaults();
    if let Some(file_config) = read_config_file(&config_file_path) {
        current_config = current_config.merge(file_config);
    }

    // clap has already folded environment variables into the CLI values
    current_config.merge(cli)
}

pub fn load_config() -> Config {
    resolve(Config::parse())
}
