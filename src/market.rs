//! # market — Closing prices จาก Yahoo Finance
//!
//! ดึงราคาปิดล่าสุดของ index ผ่าน chart API (`/v8/finance/chart/{ticker}`)
//!
//! Failures never leave this module: every error is logged and turned into
//! `None`, so a dead provider only degrades the fallback summary.

use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::DigestError,
    models::{PricePoint, Ticker},
};

/// Window wide enough to always contain one completed daily session,
/// weekends and holidays included.
const CHART_RANGE: &str = "5d";
const CHART_INTERVAL: &str = "1d";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// The chart API rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; market-digest/0.1)";

// ─── Chart API response ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error:  Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code:        String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    /// One entry per bar; `null` for bars without a close yet.
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Last non-null close of the first result, or why there is none.
    fn last_close(self, ticker: &Ticker) -> Result<f64, DigestError> {
        let unavailable = |reason: String| DigestError::DataUnavailable {
            ticker: ticker.to_string(),
            reason,
        };

        if let Some(err) = self.chart.error {
            return Err(unavailable(format!("{}: {}", err.code, err.description)));
        }

        self.chart
            .result
            .and_then(|results| results.into_iter().next())
            .and_then(|result| result.indicators)
            .and_then(|indicators| indicators.quote.into_iter().next())
            .and_then(|series| series.close.into_iter().rev().flatten().next())
            .ok_or_else(|| unavailable("no closing prices in window".into()))
    }
}

// ─── PriceFetcher ─────────────────────────────────────────────────────────────

/// Resolves tickers to their latest close.
#[derive(Debug, Clone)]
pub struct PriceFetcher {
    client:   reqwest::Client,
    base_url: String,
}

impl PriceFetcher {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build market data HTTP client")?;
        Ok(Self::with_client(client, &config.market_data_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Latest close for `ticker`, rounded to 2 decimals.
    ///
    /// Returns `None` when the provider has no data or the request fails for
    /// any reason.
    pub async fn fetch(&self, ticker: &Ticker) -> Option<PricePoint> {
        match self.try_fetch(ticker).await {
            Ok(close) => {
                let point = PricePoint::new(ticker.clone(), close);
                debug!(ticker = %ticker, close = point.close, "Close price fetched");
                Some(point)
            }
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "Close price unavailable");
                None
            }
        }
    }

    async fn try_fetch(&self, ticker: &Ticker) -> anyhow::Result<f64> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);

        let resp = self
            .client
            .get(&url)
            .query(&[("range", CHART_RANGE), ("interval", CHART_INTERVAL)])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("Market data API unreachable")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Market data API error {status}: {body}");
        }

        let chart: ChartResponse = resp
            .json()
            .await
            .context("Failed to parse chart response")?;

        Ok(chart.last_close(ticker)?)
    }
}
