//! Last-broadcast price cache

use crate::instrument::Instrument;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;

/// Outcome of recording a freshly fetched price
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// No prior value; the price was stored as the baseline
    Baseline,
    /// Price equals the cached value
    Unchanged,
    /// Price differs from the cached value, which has been replaced
    Changed { previous: Decimal },
}

/// Instrument -> last broadcast price
#[derive(Debug, Default)]
pub struct PriceCache {
    last: DashMap<Instrument, Decimal>,
}

impl PriceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Last cached price for `instrument`
    pub fn get_last(&self, instrument: &Instrument) -> Option<Decimal> {
        self.last.get(instrument).map(|price| *price)
    }

    /// Overwrite the cached price for `instrument`
    pub fn set_last(&self, instrument: &Instrument, price: Decimal) {
        self.last.insert(instrument.clone(), price);
    }

    /// Compare `price` with the cached value and store it if it is new or changed
    ///
    /// Read, compare and write happen under the instrument's shard lock.
    pub fn observe(&self, instrument: &Instrument, price: Decimal) -> Observation {
        match self.last.entry(instrument.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(price);
                Observation::Baseline
            }
            Entry::Occupied(mut slot) => {
                let previous = *slot.get();
                if previous == price {
                    Observation::Unchanged
                } else {
                    slot.insert(price);
                    Observation::Changed { previous }
                }
            }
        }
    }

    /// Number of cached instruments
    pub fn len(&self) -> usize {
        self.last.len()
    }

    /// Whether nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }
}
