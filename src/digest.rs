//! # digest — One pass of the daily market digest
//!
//! ## Flow
//! ```text
//! date = today (local, 2024年03月05日)
//!   ├─ AI available? ── yes ─▶ compose(date) ── text ─────────────▶ send summary
//!   │                              │ error / no text
//!   │                              ▼
//!   └─ no ─────────────▶ diagnostic → error identity
//!                                  ▼
//!                         compose_fallback() ── ok ──▶ "(fallback)" summary
//!                                  │ error
//!                                  ▼
//!                         2nd diagnostic + static apology
//! ```
//!
//! Every step is isolated: a failed call downgrades the output, it never
//! aborts the pass.  Exactly one final summary is delivered per run.

use anyhow::Context;
use chrono::Local;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    ai::SummaryComposer,
    config::Config,
    fallback::FallbackComposer,
    market::PriceFetcher,
    notifier::{DeliveryStatus, Notifier, DISPLAY_NAME, ERROR_DISPLAY_NAME},
    prompt,
};

/// Sent when neither the AI nor the fallback path produced anything.
pub const NO_SUMMARY_MESSAGE: &str = "本日の市場サマリーはありません。";
/// Final summary when the fallback path itself failed.
pub const RETRIEVAL_FAILED_MESSAGE: &str = "😢 市場サマリーを取得できませんでした。";

/// Discord rejects messages over 2000 characters; diagnostics carry error
/// bodies of arbitrary length.
const DIAGNOSTIC_MAX_CHARS: usize = 1900;

// ─── Outcome ──────────────────────────────────────────────────────────────────

/// Which path produced the final summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarySource {
    Ai,
    Fallback,
    /// Static apology / "no summary" notice.
    Static,
}

/// Where the final summary went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalDelivery {
    Webhook(DeliveryStatus),
    /// No webhook configured: printed to stdout.
    Console,
}

/// What one pass did.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub date:        String,
    pub source:      SummarySource,
    /// Status of each diagnostic send, in order (at most two).
    pub diagnostics: Vec<DeliveryStatus>,
    pub delivery:    FinalDelivery,
}

// ─── Digest ───────────────────────────────────────────────────────────────────

pub struct Digest {
    ai:       SummaryComposer,
    fallback: FallbackComposer,
    notifier: Notifier,
}

impl Digest {
    pub fn new(ai: SummaryComposer, fallback: FallbackComposer, notifier: Notifier) -> Self {
        Self { ai, fallback, notifier }
    }

    /// Wires every component from config.  The AI client may be absent; that
    /// is recorded in the composer, not returned as an error.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let fetcher = PriceFetcher::from_config(config)?;
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build webhook HTTP client")?;

        Ok(Self::new(
            SummaryComposer::from_config(config),
            FallbackComposer::new(fetcher, config.indices.clone()),
            Notifier::new(http, config.webhook_url.clone()),
        ))
    }

    /// Runs the pass for today's date.
    pub async fn run_today(&self) -> Outcome {
        let date = prompt::format_date(&Local::now());
        self.run(&date).await
    }

    pub async fn run(&self, date: &str) -> Outcome {
        let span = info_span!("digest", run_id = %Uuid::new_v4(), date);
        self.run_inner(date).instrument(span).await
    }

    async fn run_inner(&self, date: &str) -> Outcome {
        info!("📊 Digest run starting");

        let mut diagnostics = Vec::new();

        // 1. AI path
        let ai_result = if self.ai.is_available() {
            match self.ai.compose(date).await {
                Ok(Some(text)) => Ok(text),
                Ok(None) => Err(
                    "⚠️ Gemini から応答テキストがありませんでした (no content)。\n代替情報に切り替えます。"
                        .to_string(),
                ),
                Err(e) => {
                    warn!(error = %e.report(), "AI summary failed");
                    Err(format!(
                        "⚠️ Gemini による市場サマリー取得でエラーが発生しました。\
                         代替情報に切り替えます。\n```\n{}\n```",
                        e.report()
                    ))
                }
            }
        } else {
            let reason = self.ai.unavailable_reason().unwrap_or("unknown");
            info!(reason, "AI summary unavailable");
            Err(format!("⚠️ AI要約をスキップしました (AI skipped): {reason}\n代替情報に切り替えます。"))
        };

        // 2. Fallback path
        let (source, summary) = match ai_result {
            Ok(text) => {
                info!("✅ Using AI summary");
                (SummarySource::Ai, Some(text))
            }
            Err(diagnostic) => {
                diagnostics.push(self.send_diagnostic(&diagnostic).await);

                match self.fallback.compose_fallback().await {
                    Ok(text) => {
                        info!("Using fallback summary");
                        (SummarySource::Fallback, Some(format!("📊 {date} の市場情報 (fallback)\n{text}")))
                    }
                    Err(e) => {
                        warn!(error = %e.report(), "Fallback summary failed");
                        let diagnostic = format!(
                            "❌ 代替情報の取得にも失敗しました。\n```\n{}\n```",
                            e.report()
                        );
                        diagnostics.push(self.send_diagnostic(&diagnostic).await);
                        (SummarySource::Static, Some(RETRIEVAL_FAILED_MESSAGE.to_string()))
                    }
                }
            }
        };

        // 3. Final delivery
        let (source, text) = match summary.filter(|s| !s.trim().is_empty()) {
            Some(text) => (source, text),
            None => (SummarySource::Static, NO_SUMMARY_MESSAGE.to_string()),
        };

        let delivery = if self.notifier.is_configured() {
            let status = self.notifier.notify(&text, DISPLAY_NAME).await;
            info!(status = %status, code = status.code(), "Summary delivery");
            FinalDelivery::Webhook(status)
        } else {
            info!("Webhook URL not set — printing summary to stdout");
            println!("{text}");
            FinalDelivery::Console
        };

        info!(?source, ?delivery, diagnostics = diagnostics.len(), "🏁 Digest run finished");

        Outcome {
            date: date.to_string(),
            source,
            diagnostics,
            delivery,
        }
    }

    async fn send_diagnostic(&self, text: &str) -> DeliveryStatus {
        self.notifier
            .notify(&truncate_chars(text, DIAGNOSTIC_MAX_CHARS), ERROR_DISPLAY_NAME)
            .await
    }
}

/// Refuses to start without any way to produce or deliver output; otherwise
/// runs one pass for today.
pub async fn run_job(config: &Config) -> anyhow::Result<Outcome> {
    config.validate().context("Startup precondition failed")?;
    let digest = Digest::from_config(config)?;
    Ok(digest.run_today().await)
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
