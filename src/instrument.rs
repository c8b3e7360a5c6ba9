//! Instrument symbols and connection identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Length of an ISO 4217 currency code
const CURRENCY_CODE_LEN: usize = 3;

/// Errors raised while parsing an instrument symbol
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstrumentError {
    /// Symbol was empty after trimming
    #[error("Instrument symbol is empty")]
    Empty,
    /// Symbol contains something other than ASCII letters and digits
    #[error("Invalid characters in instrument symbol: {0}")]
    InvalidCharacters(String),
    /// Symbol is not two concatenated 3-letter currency codes
    #[error("Not a currency pair: {0}")]
    NotACurrencyPair(String),
}

/// A case-normalized instrument symbol (e.g. "EURUSD")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Instrument(String);

impl Instrument {
    /// Parse and normalize a raw client-supplied symbol
    pub fn parse(raw: &str) -> Result<Self, InstrumentError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InstrumentError::Empty);
        }

        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(InstrumentError::InvalidCharacters(trimmed.to_string()));
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// The normalized symbol
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into (from, to) currency codes, e.g. "EURUSD" -> ("EUR", "USD")
    pub fn currency_pair(&self) -> Result<(&str, &str), InstrumentError> {
        let is_pair = self.0.len() == CURRENCY_CODE_LEN * 2
            && self.0.chars().all(|c| c.is_ascii_alphabetic());

        if !is_pair {
            return Err(InstrumentError::NotACurrencyPair(self.0.clone()));
        }

        Ok(self.0.split_at(CURRENCY_CODE_LEN))
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Instrument {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Instrument {
    type Error = InstrumentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Instrument> for String {
    fn from(instrument: Instrument) -> Self {
        instrument.0
    }
}

/// Identifier of one realtime transport session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Mint a fresh random id
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0.simple())
    }
}
