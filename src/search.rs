// src/search.rs
//! General web-search side-channel used to gather auxiliary context for
//! enrichment: free-text query in, top-K (title, snippet) pairs out.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

const SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSnippet {
    pub title: String,
    pub snippet: String,
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchSnippet>>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    web: Option<WebResults>,
}

#[derive(Debug, Deserialize)]
struct WebResults {
    #[serde(default)]
    results: Vec<WebResult>,
}

#[derive(Debug, Deserialize)]
struct WebResult {
    title: Option<String>,
    description: Option<String>,
}

/// Brave Search API client. An unset `BRAVE_API_KEY` makes every call error;
/// callers degrade to their no-context placeholder.
pub struct BraveSearchClient {
    client: reqwest::Client,
    api_key: String,
}

impl BraveSearchClient {
    pub fn from_env() -> Self {
        Self {
            client: crate::collect::http_client(10),
            api_key: std::env::var("BRAVE_API_KEY").unwrap_or_default(),
        }
    }
}

/// Parse a search response payload (exposed for fixture tests).
pub fn parse_results_json(json: &str, limit: usize) -> Result<Vec<SearchSnippet>> {
    let resp: SearchResponse = serde_json::from_str(json).context("parsing web search json")?;
    let results = resp.web.map(|w| w.results).unwrap_or_default();

    let mut out = Vec::with_capacity(results.len().min(limit));
    for r in results.into_iter().take(limit) {
        let title = crate::collect::clean_text(&r.title.unwrap_or_default());
        let snippet = crate::collect::clean_text(&r.description.unwrap_or_default());
        if title.is_empty() && snippet.is_empty() {
            continue;
        }
        out.push(SearchSnippet { title, snippet });
    }
    Ok(out)
}

#[async_trait]
impl SearchClient for BraveSearchClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchSnippet>> {
        anyhow::ensure!(!self.api_key.is_empty(), "BRAVE_API_KEY not set");

        let count = limit.to_string();
        let body = self
            .client
            .get(SEARCH_URL)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await
            .context("web search http get")?
            .error_for_status()
            .context("web search non-2xx")?
            .text()
            .await
            .context("web search body")?;
        parse_results_json(&body, limit)
    }
}
