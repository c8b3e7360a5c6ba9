//! Serve command implementation

use crate::config::Config;
use crate::service::PriceHub;
use clap::Args;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the listen address
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,

    /// Override the polling interval in seconds
    #[arg(long)]
    pub interval_secs: Option<u64>,
}

impl ServeArgs {
    pub async fn execute(&self, mut config: Config) -> anyhow::Result<()> {
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(secs) = self.interval_secs {
            config.poller.interval_secs = secs;
        }
        config.validate()?;

        let source = Arc::new(super::alpha_vantage_source(&config)?);
        let bind = config.server.bind;
        let hub = PriceHub::new(config, source);

        tracing::info!(
            interval_secs = hub.config.poller.interval_secs,
            instruments = hub.config.catalog.instruments.len(),
            strict = hub.config.catalog.strict,
            "Starting price hub"
        );

        let poller = hub.scheduler().spawn();
        let listener = TcpListener::bind(bind).await?;

        let served = crate::server::serve(listener, hub, shutdown_signal()).await;

        poller.stop().await?;
        served
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
