//! # config — อ่าน Config จาก Environment Variables
//!
//! | Variable              | Default                                      |
//! |-----------------------|----------------------------------------------|
//! | `DISCORD_WEBHOOK_URL` | unset → summary printed to stdout only       |
//! | `GOOGLE_API_KEY`      | unset → AI summary skipped                   |
//! | `GEMINI_MODEL`        | `gemini-2.0-flash`                           |
//! | `GEMINI_API_URL`      | `https://generativelanguage.googleapis.com`  |
//! | `MARKET_DATA_URL`     | `https://query1.finance.yahoo.com`           |
//!
//! Empty values are treated the same as unset ones.

use anyhow::Context;

use crate::{
    error::DigestError,
    models::{IndexSpec, Ticker},
};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MARKET_DATA_URL: &str = "https://query1.finance.yahoo.com";

/// Config ทั้งหมดที่ digest job ต้องการ
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord webhook endpoint
    pub webhook_url:     Option<String>,
    /// Gemini API key
    pub google_api_key:  Option<String>,
    pub gemini_model:    String,
    pub gemini_api_url:  String,
    pub market_data_url: String,
    /// Indices listed in the fallback summary, in display order
    pub indices:         Vec<IndexSpec>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup (the process env in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            webhook_url:     var("DISCORD_WEBHOOK_URL"),
            google_api_key:  var("GOOGLE_API_KEY"),
            gemini_model:    var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_api_url:  var("GEMINI_API_URL").unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
            market_data_url: var("MARKET_DATA_URL").unwrap_or_else(|| DEFAULT_MARKET_DATA_URL.to_string()),
            indices:         default_indices().context("Invalid built-in index list")?,
        })
    }

    /// The job needs at least one way to produce or deliver output.
    pub fn validate(&self) -> Result<(), DigestError> {
        if self.webhook_url.is_none() && self.google_api_key.is_none() {
            return Err(DigestError::ConfigurationMissing(
                "neither DISCORD_WEBHOOK_URL nor GOOGLE_API_KEY is set".into(),
            ));
        }
        Ok(())
    }
}

/// S&P 500 and Nikkei 225, the two indices of the daily digest.
pub fn default_indices() -> Result<Vec<IndexSpec>, DigestError> {
    Ok(vec![
        IndexSpec::new(Ticker::new("^GSPC")?, "S&P 500", "$"),
        IndexSpec::new(Ticker::new("^N225")?, "日経平均", "¥"),
    ])
}
