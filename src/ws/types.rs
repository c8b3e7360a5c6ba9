//! WebSocket types and configuration

use std::time::Duration;
use thiserror::Error;

/// WebSocket client configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// WebSocket URL to connect to
    pub url: String,
    /// Maximum reconnection attempts before giving up (0 = infinite)
    pub max_reconnect_attempts: u32,
    /// Initial delay before first reconnection attempt
    pub initial_reconnect_delay: Duration,
    /// Maximum delay between reconnection attempts
    pub max_reconnect_delay: Duration,
    /// Interval for sending keep-alive pings
    pub ping_interval: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_reconnect_attempts: 10,
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(60),
            ping_interval: Duration::from_secs(30),
        }
    }
}

impl WsConfig {
    /// Create a new config with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set maximum reconnection attempts
    pub fn max_reconnects(mut self, n: u32) -> Self {
        self.max_reconnect_attempts = n;
        self
    }

    /// Set initial reconnection delay
    pub fn initial_delay(mut self, d: Duration) -> Self {
        self.initial_reconnect_delay = d;
        self
    }

    /// Set maximum reconnection delay
    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_reconnect_delay = d;
        self
    }

    /// Set ping interval
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }
}

/// Event emitted by the watch client
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// Connected and subscriptions sent
    Connected,
    /// Server acknowledged a subscription
    Subscribed(String),
    /// Price change for a watched instrument
    Price(crate::broadcast::PriceUpdate),
    /// Server rejected a request
    Rejected(String),
    /// Reconnecting after failure
    Reconnecting { attempt: u32 },
    /// Gave up or closed cleanly
    Disconnected,
}

/// WebSocket errors
#[derive(Debug, Clone, Error)]
pub enum WsError {
    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Maximum reconnection attempts exceeded
    #[error("Maximum reconnection attempts exceeded")]
    MaxReconnectsExceeded,
    /// Send failed
    #[error("Send failed: {0}")]
    SendFailed(String),
}
