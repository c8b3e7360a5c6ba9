//! Broadcast fan-out
//!
//! Resolves the subscriber set of an instrument from the registry and hands the
//! update to each connection through a non-blocking [`Delivery`] seam.

mod hub;
mod types;

pub use hub::{ConnectionHub, DEFAULT_OUTBOX_CAPACITY};
pub use types::{DeliveryError, PriceUpdate, PublishReport};

use crate::instrument::{ConnectionId, Instrument};
use crate::registry::SubscriptionRegistry;
use crate::telemetry;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Transport-side delivery to a single connection
///
/// Implementations must not block: a slow or dead connection reports an error
/// instead of stalling the caller.
pub trait Delivery: Send + Sync {
    /// Hand `update` to connection `conn`
    fn deliver(&self, conn: ConnectionId, update: &PriceUpdate) -> Result<(), DeliveryError>;
}

/// Delivers price updates to the current subscribers of an instrument
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<SubscriptionRegistry>,
    delivery: Arc<dyn Delivery>,
}

impl Broadcaster {
    /// Create a broadcaster over `registry` using `delivery` as transport
    pub fn new(registry: Arc<SubscriptionRegistry>, delivery: Arc<dyn Delivery>) -> Self {
        Self { registry, delivery }
    }

    /// Send `price` to every connection subscribed to `instrument`
    pub fn publish(&self, instrument: &Instrument, price: Decimal) -> PublishReport {
        let targets = self.registry.subscribers_of(instrument);
        let update = PriceUpdate::now(instrument.clone(), price);
        let mut report = PublishReport::default();

        for conn in targets {
            match self.delivery.deliver(conn, &update) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.dropped += 1;
                    tracing::warn!(%instrument, %conn, error = %e, "Dropped price update");
                }
            }
        }

        telemetry::record_publish(&report);
        tracing::info!(
            %instrument,
            %price,
            delivered = report.delivered,
            dropped = report.dropped,
            "Broadcast price update"
        );
        report
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
