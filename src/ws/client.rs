//! Reconnecting watch client for the realtime price channel

use super::types::{WatchEvent, WsConfig, WsError};
use crate::broadcast::PriceUpdate;
use crate::instrument::Instrument;
use crate::protocol::{ClientMessage, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Subscribes to a set of instruments and streams their price updates
///
/// Subscriptions are re-sent after every reconnect, since the server forgets
/// them when a connection drops.
pub struct WatchClient {
    config: WsConfig,
    instruments: Vec<Instrument>,
}

impl WatchClient {
    /// Create a client watching `instruments`
    pub fn new(config: WsConfig, instruments: Vec<Instrument>) -> Self {
        Self {
            config,
            instruments,
        }
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Connect in the background and return the event stream
    ///
    /// The stream ends after [`WatchEvent::Disconnected`].
    pub fn connect(&self) -> mpsc::Receiver<WatchEvent> {
        let (tx, rx) = mpsc::channel(1024);
        let config = self.config.clone();
        let instruments = self.instruments.clone();

        tokio::spawn(async move {
            if let Err(e) = Self::run_connection_loop(config, instruments, tx).await {
                tracing::error!(error = %e, "Watch connection loop failed");
            }
        });

        rx
    }

    /// Run the connection loop with automatic reconnection
    async fn run_connection_loop(
        config: WsConfig,
        instruments: Vec<Instrument>,
        tx: mpsc::Sender<WatchEvent>,
    ) -> Result<(), WsError> {
        let mut reconnect_attempts = 0;
        let mut reconnect_delay = config.initial_reconnect_delay;

        loop {
            match Self::connect_and_stream(&config, &instruments, &tx).await {
                Ok(()) => {
                    tracing::info!("Watch connection closed cleanly");
                    let _ = tx.send(WatchEvent::Disconnected).await;
                    break;
                }
                Err(e) => {
                    reconnect_attempts += 1;
                    tracing::warn!(
                        error = %e,
                        attempt = reconnect_attempts,
                        "Watch connection error, reconnecting..."
                    );

                    // Check max reconnects (0 = infinite)
                    if config.max_reconnect_attempts > 0
                        && reconnect_attempts >= config.max_reconnect_attempts
                    {
                        tracing::error!("Max reconnection attempts reached");
                        let _ = tx.send(WatchEvent::Disconnected).await;
                        return Err(WsError::MaxReconnectsExceeded);
                    }

                    if tx.is_closed() {
                        tracing::info!("Receiver dropped, stopping reconnection");
                        break;
                    }

                    let _ = tx
                        .send(WatchEvent::Reconnecting {
                            attempt: reconnect_attempts,
                        })
                        .await;

                    sleep(reconnect_delay).await;
                    reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay);
                }
            }
        }

        Ok(())
    }

    /// Connect, subscribe and forward server messages
    async fn connect_and_stream(
        config: &WsConfig,
        instruments: &[Instrument],
        tx: &mpsc::Sender<WatchEvent>,
    ) -> Result<(), WsError> {
        tracing::info!(url = %config.url, "Connecting to price channel");

        let (ws_stream, _response) = connect_async(config.url.as_str())
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        for instrument in instruments {
            let subscribe = ClientMessage::Subscribe {
                instrument: instrument.to_string(),
            };
            let json = serde_json::to_string(&subscribe)
                .map_err(|e| WsError::SendFailed(e.to_string()))?;
            write
                .send(Message::Text(json))
                .await
                .map_err(|e| WsError::SendFailed(e.to_string()))?;
        }

        if tx.send(WatchEvent::Connected).await.is_err() {
            return Ok(());
        }

        let mut ping_interval = tokio::time::interval(config.ping_interval);
        ping_interval.tick().await;

        loop {
            tokio::select! {
                msg = read.next() => {
                    let event = match msg {
                        Some(Ok(Message::Text(text))) => match parse_server_message(&text) {
                            Some(event) => event,
                            None => continue,
                        },
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!("Received close frame");
                            return Ok(());
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => return Err(WsError::ConnectionFailed(e.to_string())),
                        None => {
                            return Err(WsError::ConnectionFailed("Stream ended unexpectedly".into()));
                        }
                    };

                    if tx.send(event).await.is_err() {
                        tracing::debug!("Receiver dropped, closing connection");
                        return Ok(());
                    }
                }

                _ = ping_interval.tick() => {
                    let json = serde_json::to_string(&ClientMessage::Ping)
                        .map_err(|e| WsError::SendFailed(e.to_string()))?;
                    write.send(Message::Text(json)).await
                        .map_err(|e| WsError::SendFailed(e.to_string()))?;
                }
            }
        }
    }
}

/// Map a server text frame to a watch event; pongs and garbage yield `None`
fn parse_server_message(text: &str) -> Option<WatchEvent> {
    let msg: ServerMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unparseable server message");
            return None;
        }
    };

    match msg {
        ServerMessage::PriceUpdate {
            instrument,
            price,
            timestamp,
        } => {
            let instrument = Instrument::parse(&instrument).ok()?;
            Some(WatchEvent::Price(PriceUpdate {
                instrument,
                price,
                timestamp,
            }))
        }
        ServerMessage::Subscribed { instrument } => Some(WatchEvent::Subscribed(instrument)),
        ServerMessage::Error { message } => Some(WatchEvent::Rejected(message)),
        ServerMessage::Unsubscribed { .. } | ServerMessage::Pong => None,
    }
}
