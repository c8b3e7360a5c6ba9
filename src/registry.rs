//! Subscription registry
//!
//! Thread-safe mapping from instrument to the set of connections subscribed to it.
//! The registry is the single source of truth for "who receives this update";
//! transports resolve delivery targets through it rather than keeping their own groups.
//!
//! Instrument entries are pruned when their last subscriber leaves, so an entry
//! exists exactly when the instrument has at least one subscriber.

use crate::instrument::{ConnectionId, Instrument};
use dashmap::DashMap;
use std::collections::HashSet;

/// Instrument -> subscribers, with a reverse index for disconnect cleanup
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    /// Instrument -> subscribed connections
    subscribers: DashMap<Instrument, HashSet<ConnectionId>>,
    /// Connection -> instruments it joined
    memberships: DashMap<ConnectionId, HashSet<Instrument>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `conn` to the instrument's subscriber set
    ///
    /// Returns `true` if the connection was not already subscribed.
    pub fn subscribe(&self, instrument: &Instrument, conn: ConnectionId) -> bool {
        let added = self
            .subscribers
            .entry(instrument.clone())
            .or_default()
            .insert(conn);

        self.memberships
            .entry(conn)
            .or_default()
            .insert(instrument.clone());

        if added {
            tracing::debug!(%instrument, %conn, "Subscribed");
        }
        added
    }

    /// Remove `conn` from the instrument's subscriber set
    ///
    /// Returns `true` if the connection was subscribed.
    pub fn unsubscribe(&self, instrument: &Instrument, conn: ConnectionId) -> bool {
        let removed = self.detach(instrument, conn);

        if let Some(mut joined) = self.memberships.get_mut(&conn) {
            joined.remove(instrument);
        }
        self.memberships.remove_if(&conn, |_, joined| joined.is_empty());

        if removed {
            tracing::debug!(%instrument, %conn, "Unsubscribed");
        }
        removed
    }

    /// Remove `conn` from every instrument it joined
    ///
    /// Returns the instruments the connection was removed from.
    pub fn remove_connection(&self, conn: ConnectionId) -> Vec<Instrument> {
        let Some((_, joined)) = self.memberships.remove(&conn) else {
            return Vec::new();
        };

        let mut removed: Vec<Instrument> = joined
            .into_iter()
            .filter(|instrument| self.detach(instrument, conn))
            .collect();
        removed.sort();

        tracing::debug!(%conn, instruments = removed.len(), "Removed connection");
        removed
    }

    /// Snapshot of instruments with at least one subscriber
    pub fn subscribed_instruments(&self) -> Vec<Instrument> {
        let mut instruments: Vec<Instrument> = self
            .subscribers
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect();
        instruments.sort();
        instruments
    }

    /// Snapshot of connections subscribed to `instrument`
    pub fn subscribers_of(&self, instrument: &Instrument) -> Vec<ConnectionId> {
        self.subscribers
            .get(instrument)
            .map(|conns| conns.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Snapshot of instruments `conn` is subscribed to
    pub fn instruments_of(&self, conn: ConnectionId) -> Vec<Instrument> {
        let mut instruments: Vec<Instrument> = self
            .memberships
            .get(&conn)
            .map(|joined| joined.iter().cloned().collect())
            .unwrap_or_default();
        instruments.sort();
        instruments
    }

    /// Whether `conn` is subscribed to `instrument`
    pub fn is_subscribed(&self, instrument: &Instrument, conn: ConnectionId) -> bool {
        self.subscribers
            .get(instrument)
            .map(|conns| conns.contains(&conn))
            .unwrap_or(false)
    }

    /// Number of connections subscribed to `instrument`
    pub fn subscriber_count(&self, instrument: &Instrument) -> usize {
        self.subscribers
            .get(instrument)
            .map(|conns| conns.len())
            .unwrap_or(0)
    }

    /// Number of connections holding at least one subscription
    pub fn connection_count(&self) -> usize {
        self.memberships.len()
    }

    /// Drop `conn` from the forward index, pruning the entry if it empties
    fn detach(&self, instrument: &Instrument, conn: ConnectionId) -> bool {
        let removed = self
            .subscribers
            .get_mut(instrument)
            .map(|mut conns| conns.remove(&conn))
            .unwrap_or(false);

        // Re-checked under the shard lock so a concurrent subscribe is never lost.
        self.subscribers
            .remove_if(instrument, |_, conns| conns.is_empty());

        removed
    }
}
