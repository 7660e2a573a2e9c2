// src/collect/arxiv.rs
//! Scholarly collector: arXiv Atom query API, fixed search expression,
//! newest submissions first.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use once_cell::sync::OnceCell;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::collect::{clean_text, Collector};
use crate::config::ArxivCfg;
use crate::item::RawCandidate;

const QUERY_URL: &str = "https://export.arxiv.org/api/query";

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

pub struct ArxivCollector {
    client: reqwest::Client,
    query: String,
    max_results: usize,
}

impl ArxivCollector {
    pub fn new(cfg: &ArxivCfg) -> Self {
        Self {
            client: crate::collect::http_client(15),
            query: cfg.query.clone(),
            max_results: cfg.max_results,
        }
    }
}

/// Parse an Atom payload into raw candidates (exposed for fixture tests).
pub fn parse_atom_str(xml: &str, limit: usize) -> Result<Vec<RawCandidate>> {
    let t0 = std::time::Instant::now();
    let feed: Feed = from_str(xml).context("parsing arxiv atom xml")?;

    let mut out = Vec::with_capacity(feed.entries.len().min(limit));
    for entry in feed.entries.into_iter().take(limit) {
        let Some(raw_id) = entry.id else { continue };
        let id = bare_arxiv_id(&raw_id);
        let title = clean_text(&entry.title.unwrap_or_default());
        if id.is_empty() || title.is_empty() {
            continue;
        }
        let link = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .and_then(|l| l.href.clone())
            .unwrap_or_else(|| format!("https://arxiv.org/abs/{id}"));

        out.push(RawCandidate::Scholarly {
            id,
            title,
            abstract_text: clean_text(&entry.summary.unwrap_or_default()),
            link,
        });
    }

    histogram!("scan_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(out)
}

/// "http://arxiv.org/abs/2401.01234v2" -> "2401.01234"
fn bare_arxiv_id(entry_id: &str) -> String {
    let tail = entry_id.rsplit("/abs/").next().unwrap_or(entry_id);
    static RE_VERSION: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE_VERSION.get_or_init(|| regex::Regex::new(r"v\d+$").unwrap());
    re.replace(tail.trim(), "").to_string()
}

#[async_trait]
impl Collector for ArxivCollector {
    async fn fetch(&self) -> Result<Vec<RawCandidate>> {
        let max_results = self.max_results.to_string();
        let body = self
            .client
            .get(QUERY_URL)
            .query(&[
                ("search_query", self.query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", "submittedDate"),
                ("sortOrder", "descending"),
            ])
            .send()
            .await
            .context("arxiv http get")?
            .error_for_status()
            .context("arxiv non-2xx")?
            .text()
            .await
            .context("arxiv body")?;
        parse_atom_str(&body, self.max_results)
    }

    fn name(&self) -> &'static str {
        "arXiv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATOM_FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query Results</title>
  <entry>
    <id>http://arxiv.org/abs/2401.01234v2</id>
    <title>Large language models
        in clinical triage</title>
    <summary>  We study &amp;quot;LLMs&amp;quot; for triage.  </summary>
    <link href="http://arxiv.org/abs/2401.01234v2" rel="alternate" type="text/html"/>
    <link href="http://arxiv.org/pdf/2401.01234v2" rel="related" type="application/pdf"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.05678v1</id>
    <title>Second paper</title>
    <summary>Abstract two.</summary>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries_with_clean_titles_and_bare_ids() {
        let items = parse_atom_str(ATOM_FIXTURE, 10).unwrap();
        assert_eq!(items.len(), 2);
        match &items[0] {
            RawCandidate::Scholarly {
                id,
                title,
                abstract_text,
                link,
            } => {
                assert_eq!(id, "2401.01234");
                assert_eq!(title, "Large language models in clinical triage");
                assert!(abstract_text.contains("We study"));
                assert_eq!(link, "http://arxiv.org/abs/2401.01234v2");
            }
            other => panic!("expected scholarly candidate, got {other:?}"),
        }
    }

    #[test]
    fn missing_alternate_link_falls_back_to_abs_url() {
        let items = parse_atom_str(ATOM_FIXTURE, 10).unwrap();
        match &items[1] {
            RawCandidate::Scholarly { link, .. } => {
                assert_eq!(link, "https://arxiv.org/abs/2401.05678");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn limit_caps_entry_count() {
        let items = parse_atom_str(ATOM_FIXTURE, 1).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn garbage_xml_is_an_error_not_a_panic() {
        assert!(parse_atom_str("<feed><entry>", 5).is_err());
    }

    #[test]
    fn version_suffix_stripping() {
        assert_eq!(bare_arxiv_id("http://arxiv.org/abs/2401.01234v12"), "2401.01234");
        assert_eq!(bare_arxiv_id("2105.00001"), "2105.00001");
    }
}
