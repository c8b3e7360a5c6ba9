//! Shared test doubles

use async_trait::async_trait;
use price_hub::instrument::Instrument;
use price_hub::source::{PriceSource, SourceError};
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Price source replaying a fixed script per instrument
///
/// Each fetch pops the next scripted price; an exhausted script repeats its last price.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<HashMap<Instrument, VecDeque<Decimal>>>,
    last: Mutex<HashMap<Instrument, Decimal>>,
    calls: Mutex<HashMap<Instrument, usize>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, instrument: &str, prices: &[Decimal]) {
        let instrument = Instrument::parse(instrument).unwrap();
        self.script
            .lock()
            .unwrap()
            .entry(instrument)
            .or_default()
            .extend(prices.iter().copied());
    }

    pub fn calls(&self, instrument: &str) -> usize {
        let instrument = Instrument::parse(instrument).unwrap();
        self.calls
            .lock()
            .unwrap()
            .get(&instrument)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl PriceSource for ScriptedSource {
    async fn fetch_price(&self, instrument: &Instrument) -> Result<Decimal, SourceError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(instrument.clone())
            .or_default() += 1;

        let next = self
            .script
            .lock()
            .unwrap()
            .get_mut(instrument)
            .and_then(|queue| queue.pop_front());

        let mut last = self.last.lock().unwrap();
        match next.or_else(|| last.get(instrument).copied()) {
            Some(price) => {
                last.insert(instrument.clone(), price);
                Ok(price)
            }
            None => Err(SourceError::Upstream(format!("no price for {}", instrument))),
        }
    }
}
