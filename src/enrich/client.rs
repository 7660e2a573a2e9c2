// src/enrich/client.rs
//! Text-generation client: provider trait plus the OpenAI chat implementation.
//! Two profiles give explicit cost/quality tiering: `Cheap` runs once per
//! item, `Strong` once per run for the cross-item synthesis.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EnrichCfg;

const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Cheap,
    Strong,
}

#[async_trait]
pub trait GenClient: Send + Sync {
    async fn generate(&self, prompt: &str, profile: Profile) -> Result<String>;
    fn provider_name(&self) -> &'static str;
}

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    cheap_model: String,
    strong_model: String,
}

impl OpenAiClient {
    /// Reads `OPENAI_API_KEY` from the environment; an empty key makes every
    /// call error, which callers degrade to fallback text.
    pub fn from_env(cfg: &EnrichCfg) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(crate::collect::USER_AGENT)
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            cheap_model: cfg.cheap_model.clone(),
            strong_model: cfg.strong_model.clone(),
        }
    }

    fn model_for(&self, profile: Profile) -> (&str, u32) {
        match profile {
            Profile::Cheap => (self.cheap_model.as_str(), 240),
            Profile::Strong => (self.strong_model.as_str(), 600),
        }
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: String,
}

#[async_trait]
impl GenClient for OpenAiClient {
    async fn generate(&self, prompt: &str, profile: Profile) -> Result<String> {
        anyhow::ensure!(!self.api_key.is_empty(), "OPENAI_API_KEY not set");

        let (model, max_tokens) = self.model_for(profile);
        let sys = "You are a research digest assistant. Answer in plain prose, \
                   no emojis, no markdown headings.";
        let req = Req {
            model,
            messages: vec![
                Msg {
                    role: "system",
                    content: sys,
                },
                Msg {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.3,
            max_tokens,
        };

        let resp = self
            .http
            .post(CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("generation http post")?
            .error_for_status()
            .context("generation non-2xx")?;

        let body: Resp = resp.json().await.context("generation body")?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();
        anyhow::ensure!(!content.is_empty(), "generation returned empty text");
        Ok(content)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
