// src/notify/slack.rs
use anyhow::{Context, Result};
use reqwest::Client;

use super::Notifier;

pub struct SlackNotifier {
    webhook_url: Option<String>,
    client: Client,
}

impl SlackNotifier {
    pub fn from_env() -> Self {
        Self {
            webhook_url: std::env::var("SLACK_WEBHOOK_URL").ok(),
            client: Client::new(),
        }
    }

    /// Builder for tests/tools.
    pub fn new(url: String) -> Self {
        Self {
            webhook_url: Some(url),
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        let Some(url) = &self.webhook_url else {
            tracing::debug!("Slack disabled (no SLACK_WEBHOOK_URL)");
            return Ok(());
        };

        let text = format!("*{subject}*\n\n{body}");
        let payload = serde_json::json!({ "text": text });

        self.client
            .post(url)
            .json(&payload)
            .send()
            .await
            .context("slack post")?
            .error_for_status()
            .context("slack non-2xx")?;
        Ok(())
    }
}
