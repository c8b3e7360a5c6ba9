//! Watch command implementation

use crate::instrument::Instrument;
use crate::ws::{WatchClient, WatchEvent, WsConfig};
use clap::Args;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// WebSocket endpoint of a running server
    #[arg(short, long, default_value = "ws://127.0.0.1:8080/ws")]
    pub url: String,

    /// Instruments to subscribe to
    #[arg(required = true)]
    pub instruments: Vec<Instrument>,
}

impl WatchArgs {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let client = WatchClient::new(WsConfig::new(&self.url), self.instruments.clone());
        let mut events = client.connect();

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(WatchEvent::Price(update)) => {
                            println!(
                                "{} {} {}",
                                update.timestamp.to_rfc3339(),
                                update.instrument,
                                update.price
                            );
                        }
                        Some(WatchEvent::Connected) => tracing::info!(url = %self.url, "Connected"),
                        Some(WatchEvent::Subscribed(instrument)) => {
                            tracing::info!(%instrument, "Subscribed");
                        }
                        Some(WatchEvent::Rejected(message)) => {
                            tracing::warn!(%message, "Server rejected request");
                        }
                        Some(WatchEvent::Reconnecting { attempt }) => {
                            tracing::warn!(attempt, "Reconnecting");
                        }
                        Some(WatchEvent::Disconnected) | None => break,
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        Ok(())
    }
}
