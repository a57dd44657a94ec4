//! # ai — เรียก Gemini API (generateContent + Google Search grounding)
//!
//! Client construction is an explicit step ([`GeminiClient::from_config`]);
//! the result is injected into [`SummaryComposer`] as an `Option`, so a missing
//! key simply means "no AI path" rather than a failure later on.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{config::Config, error::DigestError, prompt};

const SERVICE: &str = "Gemini";

/// Grounded generation routinely takes tens of seconds.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    tools:    Vec<Tool>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role:  &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

/// Serialises to `{}`: enabling the tool takes no options.
#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// All text parts of the first candidate joined together, or `None` if the
    /// model produced no (non-blank) text.
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// ─── GeminiClient ─────────────────────────────────────────────────────────────

/// Handle on the Gemini REST API for one model.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http:     reqwest::Client,
    api_key:  String,
    model:    String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build Gemini HTTP client")?;

        Ok(Self {
            http,
            api_key:  api_key.to_string(),
            model:    model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `Ok(None)` when no API key is configured, `Err` when the client could
    /// not be built.
    pub fn from_config(config: &Config) -> Result<Option<Self>, DigestError> {
        let Some(api_key) = &config.google_api_key else {
            return Ok(None);
        };

        Self::new(api_key, &config.gemini_model, &config.gemini_api_url)
            .map(Some)
            .map_err(|source| DigestError::ExternalService { service: SERVICE, source })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One `generateContent` call with the search tool enabled. No retry.
    pub async fn generate(&self, prompt: &str) -> anyhow::Result<Option<String>> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);

        let body = GenerateRequest {
            contents: vec![RequestContent {
                role:  "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            tools: vec![Tool { google_search: GoogleSearch {} }],
        };

        debug!(model = %self.model, "Calling Gemini API...");

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Gemini API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error {status}: {text}");
        }

        let data: GenerateResponse = resp.json().await.context("Gemini response parse error")?;

        Ok(data.into_text())
    }
}

// ─── SummaryComposer (AI path) ────────────────────────────────────────────────

/// Produces the narrative summary for a date, if an AI client is available.
#[derive(Debug, Clone)]
pub struct SummaryComposer {
    client:      Option<GeminiClient>,
    /// Why `client` is `None`; shown in the diagnostic sent to the channel.
    unavailable: Option<String>,
}

impl SummaryComposer {
    pub fn new(client: Option<GeminiClient>) -> Self {
        let unavailable = client
            .is_none()
            .then(|| "Gemini クライアントが初期化されていません".to_string());
        Self { client, unavailable }
    }

    /// Builds the client from config and records which precondition failed.
    pub fn from_config(config: &Config) -> Self {
        match GeminiClient::from_config(config) {
            Ok(Some(client)) => {
                info!(model = %client.model(), "Gemini client ready");
                Self::new(Some(client))
            }
            Ok(None) => Self {
                client:      None,
                unavailable: Some("GOOGLE_API_KEY が設定されていません (no credential)".into()),
            },
            Err(e) => {
                warn!(error = %e.report(), "Gemini client construction failed");
                Self {
                    client:      None,
                    unavailable: Some(format!("Gemini クライアントの作成に失敗しました\n{}", e.report())),
                }
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        self.unavailable.as_deref()
    }

    /// Narrative summary for `date`.
    ///
    /// * `Ok(Some(text))`: the model answered.
    /// * `Ok(None)`: no client, or the model returned no text.
    /// * `Err(ExternalService)`: the call itself failed.
    pub async fn compose(&self, date: &str) -> Result<Option<String>, DigestError> {
        let Some(client) = &self.client else {
            debug!("Gemini client not initialised — skipping AI summary");
            return Ok(None);
        };

        let prompt = prompt::build_prompt(date);

        info!(model = %client.model(), date, "Requesting AI summary");

        match client.generate(&prompt).await {
            Ok(Some(text)) => {
                info!(chars = text.chars().count(), "AI summary received");
                Ok(Some(text))
            }
            Ok(None) => {
                warn!("Gemini returned no text content");
                Ok(None)
            }
            Err(source) => Err(DigestError::ExternalService { service: SERVICE, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const MODEL: &str = "gemini-test";

    fn composer(server: &MockServer) -> SummaryComposer {
        let client = GeminiClient::new("test-key", MODEL, &server.uri()).unwrap();
        SummaryComposer::new(Some(client))
    }

    fn text_response(parts: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "role": "model", "parts": parts } }]
        }))
    }

    #[tokio::test]
    async fn test_compose_returns_model_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({ "tools": [{ "google_search": {} }] })))
            .respond_with(text_response(json!([
                { "text": "テスト金融サマリー" },
                { "text": "成功" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let summary = composer(&server).compose("2023年10月26日").await.unwrap();
        assert_eq!(summary.as_deref(), Some("テスト金融サマリー成功"));
    }

    #[tokio::test]
    async fn test_prompt_sent_with_date() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(text_response(json!([{ "text": "ok" }])))
            .mount(&server)
            .await;

        composer(&server).compose("2024年01月02日").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value = requests[0].body_json().unwrap();
        let sent = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(sent.contains("日付：2024年01月02日"));
    }

    #[tokio::test]
    async fn test_no_text_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "finishReason": "SAFETY" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(composer(&server).compose("2024年01月02日").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_text_and_empty_body_are_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(text_response(json!([{ "text": "  \n" }])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let composer = composer(&server);
        assert_eq!(composer.compose("d").await.unwrap(), None);
        assert_eq!(composer.compose("d").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_service_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("API呼び出し失敗テスト"))
            .expect(1)
            .mount(&server)
            .await;

        let err = composer(&server).compose("2024年01月02日").await.unwrap_err();
        assert!(matches!(err, DigestError::ExternalService { service: "Gemini", .. }));
        assert!(err.report().contains("API呼び出し失敗テスト"));
    }

    #[tokio::test]
    async fn test_no_client_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(text_response(json!([{ "text": "unexpected" }])))
            .expect(0)
            .mount(&server)
            .await;

        let composer = SummaryComposer::new(None);
        assert!(!composer.is_available());
        assert_eq!(composer.compose("2024年01月02日").await.unwrap(), None);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn test_missing_key_reports_no_credential() {
        let config = Config::from_lookup(|key| {
            (key == "DISCORD_WEBHOOK_URL").then(|| "https://discord.test/hook".to_string())
        })
        .unwrap();

        let composer = SummaryComposer::from_config(&config);
        assert!(!composer.is_available());
        assert!(composer.unavailable_reason().unwrap().contains("GOOGLE_API_KEY"));
    }
}
