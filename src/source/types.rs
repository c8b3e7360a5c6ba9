//! Price source types

use crate::instrument::InstrumentError;
use thiserror::Error;

/// Reasons a price is unavailable
#[derive(Debug, Error)]
pub enum SourceError {
    /// Instrument cannot be mapped to an upstream query
    #[error("Invalid instrument: {0}")]
    InvalidInstrument(#[from] InstrumentError),
    /// Transport failure, including request timeouts
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Upstream answered with a non-success status
    #[error("Upstream status {0}")]
    Status(reqwest::StatusCode),
    /// Upstream answered but refused the query (rate limit, bad key, unknown pair)
    #[error("Upstream error: {0}")]
    Upstream(String),
    /// Response body did not contain a usable price
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::InvalidInstrument(_) => "invalid_instrument",
            SourceError::Http(e) if e.is_timeout() => "timeout",
            SourceError::Http(_) => "http",
            SourceError::Status(_) => "status",
            SourceError::Upstream(_) => "upstream",
            SourceError::Malformed(_) => "malformed",
        }
    }
}
