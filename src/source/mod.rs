//! Upstream price source
//!
//! Provides one-shot FX quotes for a currency pair instrument.

mod alpha_vantage;
mod types;

pub use alpha_vantage::{AlphaVantageConfig, AlphaVantageSource, ALPHA_VANTAGE_URL};
pub use types::SourceError;

use crate::instrument::Instrument;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Trait for upstream price source implementations
///
/// Any error means the price is unavailable for now; callers never treat it as fatal.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the current price of `instrument`
    async fn fetch_price(&self, instrument: &Instrument) -> Result<Decimal, SourceError>;
}
