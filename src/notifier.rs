//! # notifier — POST ข้อความไปยัง Discord Webhook

use std::{fmt, time::Duration};

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::DigestError;

/// Display name for summaries.
pub const DISPLAY_NAME: &str = "ナカヤマ";
/// Display name for diagnostics, so errors stand out in the channel.
pub const ERROR_DISPLAY_NAME: &str = "ナカヤマ (エラー通知)";

pub const AVATAR_URL: &str = "https://nagauchi.notion.site/image/attachment%3Ab902c629-b9e6-4a80-ad6e-8e3fede730f7%3Aimage.png?table=block&id=1c2b7378-9dfa-8080-89e8-f7277514877b&spaceId=a484c95d-6c4f-4e4a-97ac-db6e1790d144&width=2000&userId=&cache=v2";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Body accepted by Discord's "execute webhook" endpoint.
#[derive(Debug, Serialize)]
pub struct NotificationPayload<'a> {
    pub username:   &'a str,
    pub avatar_url: &'a str,
    pub content:    &'a str,
}

/// Result of one [`Notifier::notify`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Accepted with this (2xx) status code.
    Delivered(u16),
    /// Nothing sent: no webhook configured or empty text.
    Skipped,
    /// Transport error or non-2xx answer.
    Failed,
}

impl DeliveryStatus {
    /// Integer form: the HTTP status when delivered, `-1` otherwise.
    pub fn code(self) -> i32 {
        match self {
            DeliveryStatus::Delivered(code) => i32::from(code),
            DeliveryStatus::Skipped | DeliveryStatus::Failed => -1,
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Delivered(code) => write!(f, "delivered ({code})"),
            DeliveryStatus::Skipped         => write!(f, "skipped"),
            DeliveryStatus::Failed          => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notifier {
    client:      reqwest::Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(client: reqwest::Client, webhook_url: Option<String>) -> Self {
        Self { client, webhook_url }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Sends `text` as `display_name`. Never errors: failures are logged and
    /// reported as [`DeliveryStatus::Failed`].
    pub async fn notify(&self, text: &str, display_name: &str) -> DeliveryStatus {
        let Some(url) = &self.webhook_url else {
            info!(username = display_name, "Webhook URL not set — skipping send");
            return DeliveryStatus::Skipped;
        };
        if text.trim().is_empty() {
            info!(username = display_name, "Nothing to send — skipping");
            return DeliveryStatus::Skipped;
        }

        let payload = NotificationPayload {
            username:   display_name,
            avatar_url: AVATAR_URL,
            content:    text,
        };

        info!(username = display_name, chars = text.chars().count(), "Posting to Discord webhook...");

        match self.post(url, &payload).await {
            Ok(code) => {
                info!(status = code, "Webhook accepted message ✅");
                DeliveryStatus::Delivered(code)
            }
            Err(e) => {
                warn!(error = %e.report(), "Webhook delivery failed");
                DeliveryStatus::Failed
            }
        }
    }

    async fn post(&self, url: &str, payload: &NotificationPayload<'_>) -> Result<u16, DigestError> {
        let transport = |source: anyhow::Error| DigestError::Transport { source };

        let resp = self
            .client
            .post(url)
            .json(payload)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("Discord webhook unreachable")
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(transport(anyhow::anyhow!("Discord rejected message: HTTP {status}: {body}")));
        }

        Ok(status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn notifier(server: &MockServer) -> Notifier {
        Notifier::new(reqwest::Client::new(), Some(format!("{}/webhook", server.uri())))
    }

    #[tokio::test]
    async fn test_posts_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook"))
            .and(body_json(json!({
                "username":   DISPLAY_NAME,
                "avatar_url": AVATAR_URL,
                "content":    "hello",
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let status = notifier(&server).notify("hello", DISPLAY_NAME).await;
        assert_eq!(status, DeliveryStatus::Delivered(204));
        assert_eq!(status.code(), 204);
    }

    #[tokio::test]
    async fn test_unconfigured_skips() {
        let notifier = Notifier::new(reqwest::Client::new(), None);
        assert!(!notifier.is_configured());

        let status = notifier.notify("hello", DISPLAY_NAME).await;
        assert_eq!(status, DeliveryStatus::Skipped);
        assert_eq!(status.code(), -1);
    }

    #[tokio::test]
    async fn test_empty_text_skips() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let notifier = notifier(&server);
        assert_eq!(notifier.notify("", DISPLAY_NAME).await, DeliveryStatus::Skipped);
        assert_eq!(notifier.notify(" \n", DISPLAY_NAME).await, DeliveryStatus::Skipped);
    }

    #[tokio::test]
    async fn test_rejected_is_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("{\"message\": \"Invalid Form Body\"}"))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(notifier(&server).notify("hello", DISPLAY_NAME).await, DeliveryStatus::Failed);
    }

    #[tokio::test]
    async fn test_unreachable_is_failed() {
        let notifier = Notifier::new(reqwest::Client::new(), Some("http://127.0.0.1:9/webhook".into()));
        assert_eq!(notifier.notify("hello", DISPLAY_NAME).await, DeliveryStatus::Failed);
    }
}
