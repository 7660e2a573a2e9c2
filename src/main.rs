//! Research Radar — Binary Entrypoint
//! One-shot scheduled job: scan configured sources, filter and summarize new
//! items, post one digest, exit. Run serialization (never two concurrent
//! runs) is the invoking scheduler's responsibility.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use research_radar::collect::arxiv::ArxivCollector;
use research_radar::collect::hn::HnCollector;
use research_radar::collect::opinion::OpinionCollector;
use research_radar::collect::reddit::{RedditCollector, RedditThreadClient};
use research_radar::collect::Collector;
use research_radar::enrich::client::OpenAiClient;
use research_radar::enrich::Enricher;
use research_radar::notify::slack::SlackNotifier;
use research_radar::notify;
use research_radar::search::BraveSearchClient;
use research_radar::{pipeline, AppConfig, KeywordFilter, SeenStore};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

/// Instantiate collectors in the configured priority order.
fn build_collectors(cfg: &AppConfig, gate: &KeywordFilter) -> Vec<Box<dyn Collector>> {
    let mut out: Vec<Box<dyn Collector>> = Vec::new();
    for name in &cfg.run.order {
        match name.as_str() {
            "scholarly" => out.push(Box::new(ArxivCollector::new(&cfg.sources.arxiv))),
            "search" => out.push(Box::new(HnCollector::new(&cfg.sources.search))),
            "discussion" => out.push(Box::new(RedditCollector::new(&cfg.sources.discussion))),
            "opinion" => out.push(Box::new(OpinionCollector::new(
                &cfg.sources.opinion,
                gate.clone(),
            ))),
            other => tracing::warn!(collector = other, "unknown collector in run.order, skipping"),
        }
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in CI/production.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load()?;
    let filter = KeywordFilter::new(&cfg.relevance.allow_terms, &cfg.relevance.block_terms);
    let mut store = SeenStore::load(cfg.storage.seen_path());
    info!(seen = store.len(), path = %store.path().display(), "seen store loaded");

    let collectors = build_collectors(&cfg, &filter);
    let enricher = Enricher::new(
        Arc::new(OpenAiClient::from_env(&cfg.enrich)),
        Arc::new(BraveSearchClient::from_env()),
        Arc::new(RedditThreadClient::new(&cfg.sources.discussion)),
        cfg.enrich.search_results,
        cfg.enrich.audience.clone(),
    );

    let (report, summary) =
        pipeline::run_once(&cfg, &collectors, &filter, &mut store, &enricher).await?;
    info!(
        collected = summary.collected,
        seen_skipped = summary.seen_skipped,
        rejected = summary.rejected,
        accepted = summary.accepted,
        "run finished"
    );

    match report {
        Some(report) => {
            let notifier = SlackNotifier::from_env();
            notify::deliver(&report, &notifier).await;
        }
        None => info!("nothing new today; no notification sent"),
    }

    Ok(())
}
