//! Alpha Vantage currency exchange rate client
//!
//! Queries the `CURRENCY_EXCHANGE_RATE` function for a from/to currency pair
//! derived from the instrument symbol.

use super::{PriceSource, SourceError};
use crate::instrument::Instrument;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Alpha Vantage base URL
pub const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co";

/// Key accepted by Alpha Vantage for evaluation queries
const DEMO_API_KEY: &str = "demo";

/// Configuration for the Alpha Vantage client
#[derive(Debug, Clone)]
pub struct AlphaVantageConfig {
    /// Base URL for the API
    pub base_url: String,
    /// API key
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for AlphaVantageConfig {
    fn default() -> Self {
        Self {
            base_url: ALPHA_VANTAGE_URL.to_string(),
            api_key: DEMO_API_KEY.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Price source backed by Alpha Vantage
pub struct AlphaVantageSource {
    config: AlphaVantageConfig,
    client: Client,
}

impl AlphaVantageSource {
    /// Create a client with custom configuration
    pub fn with_config(config: AlphaVantageConfig) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Extract the exchange rate from a response body
    fn parse_response(body: &str) -> Result<Decimal, SourceError> {
        let response: ExchangeRateResponse =
            serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;

        if let Some(message) = response
            .error_message
            .or(response.note)
            .or(response.information)
        {
            return Err(SourceError::Upstream(message));
        }

        let rate = response
            .rate
            .ok_or_else(|| SourceError::Malformed("missing exchange rate block".to_string()))?;

        Decimal::from_str(rate.exchange_rate.trim())
            .map_err(|e| SourceError::Malformed(format!("bad exchange rate: {}", e)))
    }
}

#[async_trait]
impl PriceSource for AlphaVantageSource {
    async fn fetch_price(&self, instrument: &Instrument) -> Result<Decimal, SourceError> {
        let (from, to) = instrument.currency_pair()?;
        let url = format!("{}/query", self.config.base_url);

        tracing::debug!(%instrument, from, to, "Fetching exchange rate");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("function", "CURRENCY_EXCHANGE_RATE"),
                ("from_currency", from),
                ("to_currency", to),
                ("apikey", self.config.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }

        let body = response.text().await?;
        Self::parse_response(&body)
    }
}

/// Raw response from the CURRENCY_EXCHANGE_RATE function
#[derive(Debug, Deserialize)]
struct ExchangeRateResponse {
    #[serde(rename = "Realtime Currency Exchange Rate")]
    rate: Option<ExchangeRate>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    /// Rate-limit notice
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExchangeRate {
    #[serde(rename = "5. Exchange Rate")]
    exchange_rate: String,
}
