// src/collect/mod.rs
pub mod arxiv;
pub mod hn;
pub mod opinion;
pub mod reddit;

use std::time::Duration;

use anyhow::Result;
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::item::RawCandidate;

pub const USER_AGENT: &str = "research-radar/0.1 (topical research digest bot)";

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "scan_candidates_total",
            "Candidates emitted by collectors before dedup/filtering."
        );
        describe_counter!(
            "scan_collector_errors_total",
            "Collector fetch/parse errors (degraded to empty output)."
        );
        describe_histogram!("scan_parse_ms", "Collector payload parse time in milliseconds.");
    });
}

/// One external source of candidate items.
#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    /// Ordered newest/most-relevant-first per this source's notion of
    /// freshness. Errors are absorbed by `collect_all`.
    async fn fetch(&self) -> Result<Vec<RawCandidate>>;
    fn name(&self) -> &'static str;
}

/// Invoke collectors in the given priority order, preserving collector order
/// and within-collector order. A failing collector degrades to no items and
/// never halts the others.
pub async fn collect_all(collectors: &[Box<dyn Collector>]) -> Vec<RawCandidate> {
    ensure_metrics_described();

    let mut out = Vec::new();
    for c in collectors {
        match c.fetch().await {
            Ok(mut items) => {
                tracing::info!(
                    target: "collect",
                    collector = c.name(),
                    count = items.len(),
                    "collected"
                );
                counter!("scan_candidates_total").increment(items.len() as u64);
                out.append(&mut items);
            }
            Err(e) => {
                tracing::warn!(target: "collect", error = ?e, collector = c.name(), "collector error");
                counter!("scan_collector_errors_total").increment(1);
            }
        }
    }
    out
}

/// Shared HTTP client shape: fixed UA, short connect window, bounded total.
pub fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(4))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .expect("reqwest client")
}

/// Flatten source text for classification and prompts: decode HTML entities,
/// strip tags, collapse whitespace.
pub fn clean_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}
