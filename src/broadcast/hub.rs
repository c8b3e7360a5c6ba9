//! Per-connection outboxes

use super::{Delivery, DeliveryError, PriceUpdate};
use crate::instrument::ConnectionId;
use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Default number of undelivered updates buffered per connection
pub const DEFAULT_OUTBOX_CAPACITY: usize = 64;

/// Registry of bounded outboxes, one per live transport session
///
/// Delivery never waits: a connection whose outbox is full misses the update.
#[derive(Debug)]
pub struct ConnectionHub {
    outboxes: DashMap<ConnectionId, mpsc::Sender<PriceUpdate>>,
    capacity: usize,
}

impl ConnectionHub {
    /// Create a hub whose outboxes buffer `capacity` updates
    pub fn new(capacity: usize) -> Self {
        Self {
            outboxes: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Open an outbox for `conn`, replacing any previous one
    pub fn register(&self, conn: ConnectionId) -> mpsc::Receiver<PriceUpdate> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.outboxes.insert(conn, tx);
        rx
    }

    /// Close the outbox for `conn`
    ///
    /// Returns `false` if it was already closed.
    pub fn unregister(&self, conn: ConnectionId) -> bool {
        self.outboxes.remove(&conn).is_some()
    }

    /// Whether `conn` has an open outbox
    pub fn contains(&self, conn: ConnectionId) -> bool {
        self.outboxes.contains_key(&conn)
    }

    /// Number of open outboxes
    pub fn len(&self) -> usize {
        self.outboxes.len()
    }

    /// Whether no outbox is open
    pub fn is_empty(&self) -> bool {
        self.outboxes.is_empty()
    }
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOX_CAPACITY)
    }
}

impl Delivery for ConnectionHub {
    fn deliver(&self, conn: ConnectionId, update: &PriceUpdate) -> Result<(), DeliveryError> {
        // Clone the sender so the shard lock is not held while sending.
        let outbox = self
            .outboxes
            .get(&conn)
            .map(|tx| tx.clone())
            .ok_or(DeliveryError::UnknownConnection)?;

        outbox.try_send(update.clone()).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::OutboxFull,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}
