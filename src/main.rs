//! # market-digest — Daily Market Digest Job
//!
//! One run = one digest posted to Discord, then exit.  Scheduling is left to
//! cron / CI.
//!
//! ## Flow
//! ```text
//! 1. Load .env + config, refuse to start with neither webhook nor API key
//! 2. Gemini + Google Search → narrative summary
//! 3. On failure: error notice → Yahoo closing prices → fallback summary
//! 4. POST summary → Discord webhook (or stdout when no webhook)
//! ```
//!
//! ## Environment Variables
//!
//! | Variable              | Default                   | Description                    |
//! |-----------------------|---------------------------|--------------------------------|
//! | `DISCORD_WEBHOOK_URL` | —                         | Target channel webhook         |
//! | `GOOGLE_API_KEY`      | —                         | Gemini API key                 |
//! | `GEMINI_MODEL`        | `gemini-2.0-flash`        | Model used for the summary     |
//! | `RUST_LOG`            | `market_digest=info`      | Tracing filter                 |

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod ai;
mod config;
mod digest;
mod error;
mod fallback;
mod market;
mod models;
mod notifier;
mod prompt;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional — CI can use real env vars) ────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Structured logging ─────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("market_digest=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // ── 3. Config ─────────────────────────────────────────────────────────────
    let config = Config::from_env().context("Failed to load config")?;

    info!(
        webhook  = config.webhook_url.is_some(),
        ai       = config.google_api_key.is_some(),
        model    = %config.gemini_model,
        indices  = config.indices.len(),
        "Market digest starting"
    );

    // ── 4. One pass ───────────────────────────────────────────────────────────
    let outcome = digest::run_job(&config).await?;

    info!(
        date        = %outcome.date,
        source      = ?outcome.source,
        delivery    = ?outcome.delivery,
        diagnostics = outcome.diagnostics.len(),
        "Market digest done"
    );

    Ok(())
}
