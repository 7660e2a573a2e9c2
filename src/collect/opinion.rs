// src/collect/opinion.rs
//! Opinion-feed collector: one RSS feed per named source, emitting only the
//! most recent entry. These feeds are not inherently topical, so a coarse
//! allow-term gate runs before an entry is emitted at all.

use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::collect::{clean_text, Collector};
use crate::config::OpinionFeedCfg;
use crate::item::RawCandidate;
use crate::relevance::KeywordFilter;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<Guid>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Guid {
    #[serde(rename = "$text")]
    value: Option<String>,
}

/// The newest entry of one feed, before the unified candidate shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub guid: Option<String>,
    pub summary: String,
}

pub struct OpinionCollector {
    client: reqwest::Client,
    feeds: Vec<OpinionFeedCfg>,
    gate: KeywordFilter,
}

impl OpinionCollector {
    pub fn new(feeds: &[OpinionFeedCfg], gate: KeywordFilter) -> Self {
        Self {
            client: crate::collect::http_client(10),
            feeds: feeds.to_vec(),
            gate,
        }
    }
}

fn parse_rfc2822_to_unix(ts: &str) -> i64 {
    OffsetDateTime::parse(ts, &Rfc2822)
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .unwrap_or(0)
}

/// Pick the most recent entry by pubDate, falling back to document order when
/// dates are absent. Exposed for fixture tests.
pub fn parse_newest_entry(xml: &str) -> Result<Option<FeedEntry>> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).context("parsing opinion rss xml")?;

    let mut best: Option<(i64, usize, FeedEntry)> = None;
    for (idx, it) in rss.channel.item.into_iter().enumerate() {
        let title = clean_text(&it.title.unwrap_or_default());
        let link = it.link.unwrap_or_default();
        if title.is_empty() || link.is_empty() {
            continue;
        }
        let ts = it.pub_date.as_deref().map(parse_rfc2822_to_unix).unwrap_or(0);
        let entry = FeedEntry {
            title,
            link,
            guid: it.guid.and_then(|g| g.value).filter(|v| !v.is_empty()),
            summary: clean_text(&it.description.unwrap_or_default()),
        };
        let newer = match &best {
            None => true,
            // Later timestamp wins; on ties keep the earlier document position.
            Some((best_ts, best_idx, _)) => ts > *best_ts || (ts == *best_ts && idx < *best_idx),
        };
        if newer {
            best = Some((ts, idx, entry));
        }
    }
    Ok(best.map(|(_, _, e)| e))
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[async_trait]
impl Collector for OpinionCollector {
    async fn fetch(&self) -> Result<Vec<RawCandidate>> {
        let mut out = Vec::new();
        for feed in &self.feeds {
            let body = match self.client.get(&feed.url).send().await {
                Ok(r) => match r.error_for_status() {
                    Ok(r) => match r.text().await {
                        Ok(b) => b,
                        Err(e) => {
                            tracing::warn!(target: "collect", error = %e, feed = %feed.name, "feed body unreadable");
                            continue;
                        }
                    },
                    Err(e) => {
                        tracing::warn!(target: "collect", error = %e, feed = %feed.name, "feed rejected");
                        continue;
                    }
                },
                Err(e) => {
                    tracing::warn!(target: "collect", error = %e, feed = %feed.name, "feed unreachable");
                    continue;
                }
            };

            let entry = match parse_newest_entry(&body) {
                Ok(Some(e)) => e,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(target: "collect", error = %e, feed = %feed.name, "feed unparsable");
                    continue;
                }
            };

            let gate_text = format!("{} {}", entry.title, entry.summary);
            if !self.gate.has_allow_signal(&gate_text) {
                tracing::debug!(target: "collect", feed = %feed.name, "newest entry off-topic, gated");
                continue;
            }

            out.push(RawCandidate::Opinion {
                source: feed.name.clone(),
                title: entry.title,
                summary: entry.summary,
                link: entry.link,
                guid: entry.guid,
            });
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "Opinion feeds"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_FIXTURE: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example Letter</title>
    <item>
      <title>Older: on &ldquo;alignment&rdquo;</title>
      <link>https://example.test/older</link>
      <guid isPermaLink="false">post-100</guid>
      <pubDate>Mon, 01 Jan 2024 08:00:00 GMT</pubDate>
      <description>Thoughts on machine learning safety.</description>
    </item>
    <item>
      <title>Newest essay</title>
      <link>https://example.test/newest</link>
      <guid isPermaLink="false">post-101</guid>
      <pubDate>Tue, 02 Jan 2024 08:00:00 GMT</pubDate>
      <description>An essay about large language models.</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn newest_entry_wins_by_pub_date_not_document_order() {
        let entry = parse_newest_entry(RSS_FIXTURE).unwrap().unwrap();
        assert_eq!(entry.title, "Newest essay");
        assert_eq!(entry.guid.as_deref(), Some("post-101"));
    }

    #[test]
    fn dateless_feed_falls_back_to_first_item() {
        let xml = r#"<rss><channel>
            <item><title>First</title><link>https://e.test/1</link></item>
            <item><title>Second</title><link>https://e.test/2</link></item>
        </channel></rss>"#;
        let entry = parse_newest_entry(xml).unwrap().unwrap();
        assert_eq!(entry.title, "First");
    }

    #[test]
    fn empty_channel_yields_none() {
        let xml = "<rss><channel><title>x</title></channel></rss>";
        assert_eq!(parse_newest_entry(xml).unwrap(), None);
    }

    #[test]
    fn rfc2822_parse_tolerates_garbage() {
        assert_eq!(parse_rfc2822_to_unix("not a date"), 0);
        assert!(parse_rfc2822_to_unix("Tue, 02 Jan 2024 08:00:00 GMT") > 0);
    }
}
