//! Quote command implementation

use crate::config::Config;
use crate::instrument::Instrument;
use crate::source::PriceSource;
use clap::Args;

#[derive(Args, Debug)]
pub struct QuoteArgs {
    /// Instrument symbol, e.g. EURUSD
    pub instrument: Instrument,
}

impl QuoteArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        if !config.catalog.allows(&self.instrument) {
            anyhow::bail!("{} is not in the instrument catalog", self.instrument);
        }

        let source = super::alpha_vantage_source(config)?;
        let price = source.fetch_price(&self.instrument).await?;
        println!("{} {}", self.instrument, price);
        Ok(())
    }
}
