// src/collect/reddit.rs
//! Discussion-board collector: Reddit weekly-top listings for a per-run
//! sample of communities, plus a deep-fetch client that pulls one thread's
//! original post and its top comments for enrichment context.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serde::Deserialize;

use crate::collect::{clean_text, Collector};
use crate::config::DiscussionCfg;
use crate::item::RawCandidate;

const BASE_URL: &str = "https://www.reddit.com";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: String,
    subreddit: String,
    title: String,
    #[serde(default)]
    selftext: String,
    permalink: String,
    #[serde(default)]
    stickied: bool,
}

pub struct RedditCollector {
    client: reqwest::Client,
    communities: Vec<String>,
    sample_size: usize,
    max_posts: usize,
}

impl RedditCollector {
    pub fn new(cfg: &DiscussionCfg) -> Self {
        Self {
            client: crate::collect::http_client(10),
            communities: cfg.communities.clone(),
            sample_size: cfg.sample_size,
            max_posts: cfg.max_posts,
        }
    }

    /// Per-run sample without replacement; fewer communities than the sample
    /// size just yields all of them.
    fn sample_communities(&self) -> Vec<String> {
        let mut rng = rand::rng();
        self.communities
            .choose_multiple(&mut rng, self.sample_size)
            .cloned()
            .collect()
    }
}

/// Parse one community's listing payload (exposed for fixture tests).
pub fn parse_listing_json(json: &str, limit: usize) -> Result<Vec<RawCandidate>> {
    let listing: Listing = serde_json::from_str(json).context("parsing reddit listing json")?;

    let mut out = Vec::with_capacity(listing.data.children.len().min(limit));
    for child in listing.data.children {
        if out.len() == limit {
            break;
        }
        let p = child.data;
        if p.stickied || p.title.is_empty() {
            continue;
        }
        out.push(RawCandidate::Discussion {
            id: p.id,
            community: p.subreddit,
            title: clean_text(&p.title),
            body: clean_text(&p.selftext),
            permalink: format!("{BASE_URL}{}", p.permalink),
        });
    }
    Ok(out)
}

#[async_trait]
impl Collector for RedditCollector {
    async fn fetch(&self) -> Result<Vec<RawCandidate>> {
        let limit = self.max_posts.to_string();
        let mut out = Vec::new();
        for community in self.sample_communities() {
            let url = format!("{BASE_URL}/r/{community}/top.json");
            let resp = self
                .client
                .get(&url)
                .query(&[("t", "week"), ("limit", limit.as_str())])
                .send()
                .await;

            // One community failing must not cost us the others.
            let body = match resp {
                Ok(r) => match r.error_for_status() {
                    Ok(r) => match r.text().await {
                        Ok(b) => b,
                        Err(e) => {
                            tracing::warn!(target: "collect", error = %e, %community, "reddit listing body unreadable");
                            continue;
                        }
                    },
                    Err(e) => {
                        tracing::warn!(target: "collect", error = %e, %community, "reddit listing rejected");
                        continue;
                    }
                },
                Err(e) => {
                    tracing::warn!(target: "collect", error = %e, %community, "reddit listing unreachable");
                    continue;
                }
            };

            match parse_listing_json(&body, self.max_posts) {
                Ok(mut items) => out.append(&mut items),
                Err(e) => {
                    tracing::warn!(target: "collect", error = %e, %community, "reddit listing unparsable");
                }
            }
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "Reddit"
    }
}

// ---------------------------------------------------------------------------
// Deep fetch
// ---------------------------------------------------------------------------

/// One thread's original post plus its top comment bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadDetail {
    pub post_text: String,
    pub comments: Vec<String>,
}

/// Deep-fetch outcome. `Blocked` covers refusals (403/429) and transport
/// failures alike; the caller falls back to a web search on the title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadFetch {
    Fetched(ThreadDetail),
    Blocked,
}

#[async_trait]
pub trait ThreadFetcher: Send + Sync {
    async fn fetch_thread(&self, permalink: &str) -> ThreadFetch;
}

pub struct RedditThreadClient {
    client: reqwest::Client,
    max_comments: usize,
}

impl RedditThreadClient {
    pub fn new(cfg: &DiscussionCfg) -> Self {
        Self {
            client: crate::collect::http_client(10),
            max_comments: cfg.max_comments,
        }
    }
}

/// Parse a `<permalink>.json` payload: `[post listing, comment listing]`.
/// Exposed for fixture tests.
pub fn parse_thread_json(json: &str, max_comments: usize) -> Result<ThreadDetail> {
    let v: serde_json::Value = serde_json::from_str(json).context("parsing reddit thread json")?;

    let post_text = v
        .pointer("/0/data/children/0/data/selftext")
        .and_then(|t| t.as_str())
        .map(clean_text)
        .unwrap_or_default();

    let mut comments = Vec::new();
    if let Some(children) = v.pointer("/1/data/children").and_then(|c| c.as_array()) {
        for child in children {
            if comments.len() == max_comments {
                break;
            }
            // "more" stubs carry no body.
            if child.pointer("/kind").and_then(|k| k.as_str()) == Some("more") {
                continue;
            }
            if let Some(body) = child.pointer("/data/body").and_then(|b| b.as_str()) {
                let body = clean_text(body);
                if !body.is_empty() {
                    comments.push(body);
                }
            }
        }
    }

    Ok(ThreadDetail {
        post_text,
        comments,
    })
}

#[async_trait]
impl ThreadFetcher for RedditThreadClient {
    async fn fetch_thread(&self, permalink: &str) -> ThreadFetch {
        let url = format!("{}.json", permalink.trim_end_matches('/'));
        let limit = self.max_comments.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[("limit", limit.as_str())])
            .send()
            .await;

        let body = match resp {
            Ok(r) if r.status().is_success() => match r.text().await {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(target: "collect", error = %e, url, "thread body unreadable");
                    return ThreadFetch::Blocked;
                }
            },
            Ok(r) => {
                tracing::warn!(target: "collect", status = %r.status(), url, "thread fetch refused");
                return ThreadFetch::Blocked;
            }
            Err(e) => {
                tracing::warn!(target: "collect", error = %e, url, "thread fetch failed");
                return ThreadFetch::Blocked;
            }
        };

        match parse_thread_json(&body, self.max_comments) {
            Ok(detail) => ThreadFetch::Fetched(detail),
            Err(e) => {
                tracing::warn!(target: "collect", error = %e, url, "thread json unparsable");
                ThreadFetch::Blocked
            }
        }
    }
}
