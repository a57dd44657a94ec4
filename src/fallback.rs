//! # fallback — Template summary from raw closing prices
//!
//! Used when the narrative summary is unavailable.  Never depends on the AI
//! service, and a missing price only turns its own line into `N/A`.

use tracing::info;

use crate::{
    error::DigestError,
    market::PriceFetcher,
    models::{IndexSpec, PricePoint},
};

/// Shown in place of a price the provider could not supply.
pub const NOT_AVAILABLE: &str = "N/A";

const HEADER: &str = "Yahoo Finance による代替情報:";

pub struct FallbackComposer {
    fetcher: PriceFetcher,
    indices: Vec<IndexSpec>,
}

impl FallbackComposer {
    pub fn new(fetcher: PriceFetcher, indices: Vec<IndexSpec>) -> Self {
        Self { fetcher, indices }
    }

    /// Header plus one line per configured index.
    ///
    /// Fails only when no index is configured; individual fetch failures are
    /// rendered as [`NOT_AVAILABLE`].
    pub async fn compose_fallback(&self) -> Result<String, DigestError> {
        if self.indices.is_empty() {
            return Err(DigestError::ConfigurationMissing("no indices configured".into()));
        }

        let mut message = format!("{HEADER}\n");
        let mut resolved = 0usize;

        for index in &self.indices {
            let price = self.fetcher.fetch(&index.ticker).await;
            resolved += usize::from(price.is_some());
            message.push_str(&format_line(index, price.as_ref()));
            message.push('\n');
        }

        info!(resolved, total = self.indices.len(), "Fallback summary rendered");
        Ok(message)
    }
}

/// `"📈 S&P 500 前日終値: $5,123.40"`, or `N/A` for a missing price.
pub fn format_line(index: &IndexSpec, price: Option<&PricePoint>) -> String {
    let value = match price {
        Some(p) => format!("{}{}", index.currency, format_price(p.close)),
        None => NOT_AVAILABLE.to_string(),
    };
    format!("{} {} 前日終値: {}", index.icon, index.label, value)
}

/// Two decimals with `,` thousands separators: `38123.4` → `"38,123.40"`.
pub fn format_price(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}
