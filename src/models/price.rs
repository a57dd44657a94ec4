//! # models::price
//!
//! Defines [`Ticker`], [`PricePoint`] and [`IndexSpec`]: the few scalar values
//! the fallback summary is built from.
//!
//! A missing price is modelled as `Option<PricePoint>`; there is no sentinel
//! value inside the struct itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DigestError;

// ─── Ticker ───────────────────────────────────────────────────────────────────

/// Provider symbol of a tradable index, e.g. `"^GSPC"` or `"^N225"`.
///
/// Opaque apart from being non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    pub fn new(symbol: impl Into<String>) -> Result<Self, DigestError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(DigestError::ConfigurationMissing("empty ticker symbol".into()));
        }
        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── PricePoint ───────────────────────────────────────────────────────────────

/// Latest closing price for a ticker.
///
/// "Latest" is whatever the provider reports as the most recent session; while
/// a market is open that can be the running, not yet final, price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub ticker: Ticker,
    /// Always rounded to 2 decimal places.
    pub close:  f64,
}

impl PricePoint {
    pub fn new(ticker: Ticker, raw_close: f64) -> Self {
        Self { ticker, close: round2(raw_close) }
    }
}

/// Rounds half away from zero to 2 decimal places.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ─── IndexSpec ────────────────────────────────────────────────────────────────

/// One line of the fallback summary: which ticker to fetch and how to label it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub ticker:   Ticker,
    /// Human label, e.g. `"S&P 500"`.
    pub label:    String,
    /// Prefix written before the price, e.g. `"$"`.
    pub currency: String,
    pub icon:     String,
}

impl IndexSpec {
    pub fn new(ticker: Ticker, label: &str, currency: &str) -> Self {
        Self {
            ticker,
            label:    label.to_string(),
            currency: currency.to_string(),
            icon:     "📈".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ticker_rejected() {
        assert!(Ticker::new("").is_err());
        assert!(Ticker::new("   ").is_err());
        assert_eq!(Ticker::new("^GSPC").unwrap().as_str(), "^GSPC");
    }

    #[test]
    fn test_price_point_rounds_to_cents() {
        let ticker = Ticker::new("^N225").unwrap();
        assert_eq!(PricePoint::new(ticker.clone(), 38123.456).close, 38123.46);
        assert_eq!(PricePoint::new(ticker.clone(), 5000.0).close, 5000.0);
        assert_eq!(PricePoint::new(ticker, 4999.994).close, 4999.99);
    }
}
