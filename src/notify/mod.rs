// src/notify/mod.rs
pub mod slack;

use async_trait::async_trait;

use crate::item::DailyReport;

/// Delivery channel contract: attempt once, surface the error, no retries.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Render a report into one (subject, body) message. The sink stays a dumb
/// renderer: summaries and synthesis were already normalized upstream.
pub fn render_report(report: &DailyReport) -> (String, String) {
    let date = chrono::Utc::now().format("%Y-%m-%d");
    let subject = format!(
        "Research radar — {} new item{} ({date})",
        report.items.len(),
        if report.items.len() == 1 { "" } else { "s" },
    );

    let mut body = String::new();
    for item in &report.items {
        let c = &item.candidate;
        body.push_str(&format!("*<{}|{}>* — _{}_\n{}\n\n", c.link, c.title, c.source, item.summary));
    }
    body.push_str(&format!("*Synthesis*\n{}", report.synthesis));

    (subject, body)
}

/// Render and attempt delivery. A delivery failure is logged and absorbed:
/// the seen set was already updated, so the report is silently dropped
/// rather than risking a duplicate notification later.
pub async fn deliver(report: &DailyReport, notifier: &dyn Notifier) {
    let (subject, body) = render_report(report);
    match notifier.send(&subject, &body).await {
        Ok(()) => tracing::info!(target: "notify", items = report.items.len(), "report delivered"),
        Err(e) => tracing::error!(target: "notify", error = %e, "report delivery failed; dropping"),
    }
}
