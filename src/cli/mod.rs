//! CLI interface for price-hub
//!
//! Provides subcommands for:
//! - `serve`: Run the HTTP/WebSocket server and polling loop
//! - `quote`: Fetch one price and print it
//! - `watch`: Stream updates from a running server
//! - `config`: Show configuration

mod quote;
mod serve;
mod watch;

pub use quote::QuoteArgs;
pub use serve::ServeArgs;
pub use watch::WatchArgs;

use crate::config::Config;
use crate::source::{AlphaVantageConfig, AlphaVantageSource};
use clap::{Parser, Subcommand};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "price-hub")]
#[command(about = "Realtime price subscription hub backed by Alpha Vantage")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the server and polling loop
    Serve(ServeArgs),
    /// Fetch a single price
    Quote(QuoteArgs),
    /// Stream price updates from a running server
    Watch(WatchArgs),
    /// Show configuration
    Config,
}

/// Build the upstream client from the `[source]` section
pub(crate) fn alpha_vantage_source(config: &Config) -> anyhow::Result<AlphaVantageSource> {
    let mut source = AlphaVantageConfig {
        base_url: config.source.base_url.clone(),
        timeout: Duration::from_secs(config.source.timeout_secs),
        ..Default::default()
    };
    match config.api_key() {
        Some(key) => source.api_key = key,
        None => tracing::warn!("No API key configured, using the Alpha Vantage demo key"),
    }
    Ok(AlphaVantageSource::with_config(source)?)
}
