//! Broadcast types

use crate::instrument::Instrument;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A material price change pushed to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    /// Instrument that moved
    pub instrument: Instrument,
    /// New price
    pub price: Decimal,
    /// When the change was detected
    pub timestamp: DateTime<Utc>,
}

impl PriceUpdate {
    /// Create an update stamped with the current time
    pub fn now(instrument: Instrument, price: Decimal) -> Self {
        Self {
            instrument,
            price,
            timestamp: Utc::now(),
        }
    }
}

/// Per-connection delivery failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// No outbox registered for the connection
    #[error("Unknown connection")]
    UnknownConnection,
    /// The connection is not draining its outbox fast enough
    #[error("Outbox full")]
    OutboxFull,
    /// The connection's outbox receiver is gone
    #[error("Outbox closed")]
    Closed,
}

/// Summary of one publish call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Connections the update was handed to
    pub delivered: usize,
    /// Connections that could not take the update
    pub dropped: usize,
}
