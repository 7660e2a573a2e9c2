// src/collect/hn.rs
//! Broad-query collector: Hacker News via the Algolia search API, free-text
//! query, top-K stories by submission recency.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::collect::{clean_text, Collector};
use crate::config::SearchCfg;
use crate::item::RawCandidate;

const SEARCH_URL: &str = "https://hn.algolia.com/api/v1/search_by_date";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "objectID")]
    object_id: String,
    title: Option<String>,
    url: Option<String>,
    story_text: Option<String>,
}

pub struct HnCollector {
    client: reqwest::Client,
    query: String,
    max_results: usize,
}

impl HnCollector {
    pub fn new(cfg: &SearchCfg) -> Self {
        Self {
            client: crate::collect::http_client(10),
            query: cfg.query.clone(),
            max_results: cfg.max_results,
        }
    }
}

/// Parse an Algolia response payload (exposed for fixture tests).
pub fn parse_search_json(json: &str, limit: usize) -> Result<Vec<RawCandidate>> {
    let resp: SearchResponse = serde_json::from_str(json).context("parsing hn search json")?;

    let mut out = Vec::with_capacity(resp.hits.len().min(limit));
    for hit in resp.hits.into_iter().take(limit) {
        // Comments and jobs carry no title; stories always do.
        let Some(title) = hit.title else { continue };
        let title = clean_text(&title);
        if title.is_empty() {
            continue;
        }
        out.push(RawCandidate::Search {
            id: hit.object_id,
            title,
            url: hit.url.filter(|u| !u.is_empty()),
            body: hit
                .story_text
                .map(|t| clean_text(&t))
                .filter(|t| !t.is_empty()),
        });
    }
    Ok(out)
}

#[async_trait]
impl Collector for HnCollector {
    async fn fetch(&self) -> Result<Vec<RawCandidate>> {
        let per_page = self.max_results.to_string();
        let body = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("query", self.query.as_str()),
                ("tags", "story"),
                ("hitsPerPage", per_page.as_str()),
            ])
            .send()
            .await
            .context("hn http get")?
            .error_for_status()
            .context("hn non-2xx")?
            .text()
            .await
            .context("hn body")?;
        parse_search_json(&body, self.max_results)
    }

    fn name(&self) -> &'static str {
        "Hacker News"
    }
}
