//! Configuration types for price-hub

use crate::instrument::Instrument;
use crate::telemetry::LogFormat;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

/// Environment variable that overrides `source.api_key`
pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// HTTP / WebSocket server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    /// Undelivered updates buffered per connection before dropping
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}
fn default_outbox_capacity() -> usize {
    crate::broadcast::DEFAULT_OUTBOX_CAPACITY
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            outbox_capacity: default_outbox_capacity(),
        }
    }
}

/// Instruments offered to clients
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Symbols listed by `GET /instruments`
    #[serde(default = "default_instruments")]
    pub instruments: Vec<Instrument>,
    /// Reject subscriptions and quotes for symbols outside the list
    #[serde(default)]
    pub strict: bool,
}

fn default_instruments() -> Vec<Instrument> {
    ["EURUSD", "USDJPY", "BTCUSD"]
        .iter()
        .filter_map(|s| Instrument::parse(s).ok())
        .collect()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            instruments: default_instruments(),
            strict: false,
        }
    }
}

impl CatalogConfig {
    /// Whether `instrument` may be quoted or subscribed to
    pub fn allows(&self, instrument: &Instrument) -> bool {
        !self.strict || self.instruments.contains(instrument)
    }
}

/// Upstream price source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key; overridden by `ALPHAVANTAGE_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    crate::source::ALPHA_VANTAGE_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Polling loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    /// Delay between polling passes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Upstream fetches in flight at once
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

fn default_interval_secs() -> u64 {
    10
}
fn default_max_concurrent_fetches() -> usize {
    4
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

impl PollerConfig {
    /// Delay between polling passes
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus scrape port; exporter disabled when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that parse but cannot run
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.poller.interval_secs > 0,
            "poller.interval_secs must be positive"
        );
        anyhow::ensure!(
            self.poller.max_concurrent_fetches > 0,
            "poller.max_concurrent_fetches must be positive"
        );
        anyhow::ensure!(
            self.server.outbox_capacity > 0,
            "server.outbox_capacity must be positive"
        );
        Ok(())
    }

    /// API key from the environment, falling back to the config file
    pub fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.source.api_key.clone())
    }
}
