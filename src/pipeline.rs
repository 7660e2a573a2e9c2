// src/pipeline.rs
//! Run orchestration: collection → dedup → cap → classification → enrichment
//! → seen-set persistence, in one ordered pass.
//!
//! Failure isolation summary: collector and enrichment failures degrade at
//! their unit boundary. A seen-store write failure is the one fatal class:
//! swallowing it would re-notify the same item on every future run.

use std::time::Duration;

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::collect::{collect_all, Collector};
use crate::config::AppConfig;
use crate::enrich::Enricher;
use crate::item::{AcceptedItem, DailyReport};
use crate::relevance::KeywordFilter;
use crate::seen::SeenStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub collected: usize,
    pub seen_skipped: usize,
    pub rejected: usize,
    pub accepted: usize,
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scan_seen_skipped_total", "Candidates already in the seen set.");
        describe_counter!("scan_rejected_total", "Candidates rejected by the keyword gate.");
        describe_counter!("scan_accepted_total", "Candidates accepted into the report.");
        describe_gauge!("scan_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Drive one full run. Returns the report (None when nothing was accepted)
/// plus stage counts for logging and tests.
pub async fn run_once(
    cfg: &AppConfig,
    collectors: &[Box<dyn Collector>],
    filter: &KeywordFilter,
    store: &mut SeenStore,
    enricher: &Enricher,
) -> Result<(Option<DailyReport>, RunSummary)> {
    ensure_metrics_described();

    let cap = cfg.run.max_items;
    let raw = collect_all(collectors).await;

    let mut summary = RunSummary {
        collected: raw.len(),
        ..RunSummary::default()
    };
    let mut accepted: Vec<AcceptedItem> = Vec::new();

    for raw_item in raw {
        let candidate = raw_item.unify();

        if store.contains(&candidate.external_id) {
            summary.seen_skipped += 1;
            counter!("scan_seen_skipped_total").increment(1);
            continue;
        }

        if accepted.len() == cap {
            // Remaining candidates are dropped for this run and not marked
            // seen, so they can resurface next run.
            tracing::info!(target: "pipeline", cap, "accepted cap reached, stopping scan");
            break;
        }

        if candidate.kind.needs_classification() {
            let verdict = filter.classify(&candidate.title, &candidate.body);
            if !verdict.is_accept() {
                tracing::debug!(
                    target: "pipeline",
                    id = %candidate.external_id,
                    ?verdict,
                    "rejected by keyword gate"
                );
                summary.rejected += 1;
                counter!("scan_rejected_total").increment(1);
                continue;
            }
        }

        // Fixed pacing between successive enrichment calls.
        if !accepted.is_empty() && cfg.run.pace_ms > 0 {
            tokio::time::sleep(Duration::from_millis(cfg.run.pace_ms)).await;
        }

        tracing::info!(target: "pipeline", id = %candidate.external_id, source = %candidate.source, "accepting item");
        let summary_text = enricher.summarize(&candidate).await;
        let external_id = candidate.external_id.clone();
        accepted.push(AcceptedItem {
            candidate,
            summary: summary_text,
        });

        // Synchronous, before the next candidate: bounds crash loss to the
        // item in flight. Write failure aborts the run.
        store.record(&external_id)?;
        summary.accepted += 1;
        counter!("scan_accepted_total").increment(1);
    }

    gauge!("scan_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

    if accepted.is_empty() {
        return Ok((None, summary));
    }

    let synthesis = enricher.synthesize(&accepted).await;
    Ok((
        Some(DailyReport {
            items: accepted,
            synthesis,
        }),
        summary,
    ))
}
