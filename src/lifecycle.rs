//! Connection lifecycle
//!
//! Maps transport events (connect, subscribe, unsubscribe, disconnect) onto the
//! subscription registry and the connection hub.

use crate::broadcast::{ConnectionHub, PriceUpdate};
use crate::config::CatalogConfig;
use crate::instrument::{ConnectionId, Instrument, InstrumentError};
use crate::registry::SubscriptionRegistry;
use crate::telemetry::{self, GaugeMetric};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Client request that was rejected
///
/// Rejections are reported to the requesting client only and change no state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Symbol could not be parsed
    #[error(transparent)]
    Malformed(#[from] InstrumentError),
    /// Symbol is not offered by this server
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(Instrument),
    /// Session has already been disconnected
    #[error("Connection closed: {0}")]
    ConnectionClosed(ConnectionId),
}

/// Hooks realtime sessions into the registry
#[derive(Debug)]
pub struct ConnectionLifecycle {
    registry: Arc<SubscriptionRegistry>,
    hub: Arc<ConnectionHub>,
    catalog: CatalogConfig,
}

impl ConnectionLifecycle {
    /// Create a lifecycle over shared registry and hub
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        hub: Arc<ConnectionHub>,
        catalog: CatalogConfig,
    ) -> Self {
        Self {
            registry,
            hub,
            catalog,
        }
    }

    /// Open a session with its own outbox
    ///
    /// Dropping the returned session disconnects it.
    pub fn connect(self: &Arc<Self>) -> ConnectionSession {
        let id = ConnectionId::new_v4();
        let outbox = self.hub.register(id);
        telemetry::set_gauge(GaugeMetric::Connections, self.hub.len());
        tracing::info!(conn = %id, "Connection opened");

        ConnectionSession {
            id,
            outbox,
            lifecycle: Arc::clone(self),
        }
    }

    /// Subscribe `conn` to the instrument named by `raw`
    pub fn subscribe(&self, conn: ConnectionId, raw: &str) -> Result<Instrument, ProtocolError> {
        let instrument = self.resolve(conn, raw)?;
        self.attach(conn, &instrument)?;
        tracing::info!(%conn, %instrument, "Subscribed");
        Ok(instrument)
    }

    /// Unsubscribe `conn` from the instrument named by `raw`
    pub fn unsubscribe(&self, conn: ConnectionId, raw: &str) -> Result<Instrument, ProtocolError> {
        let instrument = self.resolve(conn, raw)?;
        self.registry.unsubscribe(&instrument, conn);
        tracing::info!(%conn, %instrument, "Unsubscribed");
        Ok(instrument)
    }

    /// Tear down `conn`: close its outbox and drop all its subscriptions
    ///
    /// Only the first call for a connection has any effect; returns whether this was it.
    pub fn disconnect(&self, conn: ConnectionId) -> bool {
        if !self.hub.unregister(conn) {
            return false;
        }

        let removed = self.registry.remove_connection(conn);
        telemetry::set_gauge(GaugeMetric::Connections, self.hub.len());
        tracing::info!(%conn, instruments = removed.len(), "Connection closed");
        true
    }

    /// Instruments `conn` currently receives
    pub fn subscriptions_of(&self, conn: ConnectionId) -> Vec<Instrument> {
        self.registry.instruments_of(conn)
    }

    /// Record the subscription, then re-check the outbox
    ///
    /// `disconnect` closes the outbox before clearing the registry, so a
    /// disconnect that slipped in after `resolve` is either seen here or
    /// still to clear this entry itself.
    fn attach(&self, conn: ConnectionId, instrument: &Instrument) -> Result<(), ProtocolError> {
        self.registry.subscribe(instrument, conn);
        if !self.hub.contains(conn) {
            self.registry.remove_connection(conn);
            return Err(ProtocolError::ConnectionClosed(conn));
        }
        Ok(())
    }

    fn resolve(&self, conn: ConnectionId, raw: &str) -> Result<Instrument, ProtocolError> {
        if !self.hub.contains(conn) {
            return Err(ProtocolError::ConnectionClosed(conn));
        }

        let instrument = Instrument::parse(raw)?;
        if !self.catalog.allows(&instrument) {
            return Err(ProtocolError::UnknownInstrument(instrument));
        }
        Ok(instrument)
    }
}

/// A live realtime session
///
/// Holds the receiving end of the connection's outbox. Disconnect cleanup runs
/// when the session is dropped, however the transport task ends.
#[derive(Debug)]
pub struct ConnectionSession {
    id: ConnectionId,
    outbox: mpsc::Receiver<PriceUpdate>,
    lifecycle: Arc<ConnectionLifecycle>,
}

impl ConnectionSession {
    /// Session id
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Subscribe this session to `raw`
    pub fn subscribe(&self, raw: &str) -> Result<Instrument, ProtocolError> {
        self.lifecycle.subscribe(self.id, raw)
    }

    /// Unsubscribe this session from `raw`
    pub fn unsubscribe(&self, raw: &str) -> Result<Instrument, ProtocolError> {
        self.lifecycle.unsubscribe(self.id, raw)
    }

    /// Next update addressed to this session
    ///
    /// Returns `None` once the session has been disconnected.
    pub async fn next_update(&mut self) -> Option<PriceUpdate> {
        self.outbox.recv().await
    }
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        self.lifecycle.disconnect(self.id);
    }
}
