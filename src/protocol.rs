//! Realtime channel wire messages
//!
//! JSON text frames tagged by `type`, e.g.
//! `{"type":"subscribe","instrument":"EURUSD"}` from the client and
//! `{"type":"price_update","instrument":"EURUSD","price":"1.1050","timestamp":"..."}`
//! from the server.

use crate::broadcast::PriceUpdate;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Message sent by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start receiving updates for an instrument
    Subscribe { instrument: String },
    /// Stop receiving updates for an instrument
    Unsubscribe { instrument: String },
    /// Keep-alive
    Ping,
}

/// Message pushed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Subscription accepted
    Subscribed { instrument: String },
    /// Unsubscription accepted
    Unsubscribed { instrument: String },
    /// Material price change for a subscribed instrument
    PriceUpdate {
        instrument: String,
        price: Decimal,
        timestamp: DateTime<Utc>,
    },
    /// Request rejected; nothing changed
    Error { message: String },
    /// Keep-alive reply
    Pong,
}

impl From<PriceUpdate> for ServerMessage {
    fn from(update: PriceUpdate) -> Self {
        ServerMessage::PriceUpdate {
            instrument: update.instrument.into(),
            price: update.price,
            timestamp: update.timestamp,
        }
    }
}
