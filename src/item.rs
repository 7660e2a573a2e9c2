// src/item.rs
//! Item shapes: per-source raw candidates, the unified candidate used by the
//! pipeline, and deterministic external-id derivation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Scholarly,
    Search,
    Discussion,
    Opinion,
}

impl SourceKind {
    /// Scholarly items come from a fixed curated query, so the keyword gate
    /// is skipped for them; everything else must show a positive signal.
    pub fn needs_classification(self) -> bool {
        !matches!(self, SourceKind::Scholarly)
    }
}

/// One raw candidate as emitted by a collector. Each variant carries only the
/// fields its source can guarantee; unification happens before dedup or
/// classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCandidate {
    Scholarly {
        /// arXiv id with the version suffix already stripped, e.g. "2401.01234".
        id: String,
        title: String,
        abstract_text: String,
        link: String,
    },
    Search {
        /// Search-index object id, stable per story.
        id: String,
        title: String,
        url: Option<String>,
        body: Option<String>,
    },
    Discussion {
        /// Board-native post id, e.g. "1abcd2".
        id: String,
        community: String,
        title: String,
        body: String,
        /// Absolute thread URL; also the deep-fetch key.
        permalink: String,
    },
    Opinion {
        source: String,
        title: String,
        summary: String,
        link: String,
        guid: Option<String>,
    },
}

/// Unified candidate shape the pipeline operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub kind: SourceKind,
    /// Human-readable source label, e.g. "arXiv", "r/MachineLearning".
    pub source: String,
    pub external_id: String,
    pub title: String,
    /// May be empty; classification then runs on the title alone.
    pub body: String,
    pub link: String,
}

impl RawCandidate {
    pub fn unify(self) -> Candidate {
        match self {
            RawCandidate::Scholarly {
                id,
                title,
                abstract_text,
                link,
            } => Candidate {
                kind: SourceKind::Scholarly,
                source: "arXiv".to_string(),
                external_id: format!("arxiv:{id}"),
                title,
                body: abstract_text,
                link,
            },
            RawCandidate::Search {
                id,
                title,
                url,
                body,
            } => Candidate {
                kind: SourceKind::Search,
                source: "Hacker News".to_string(),
                external_id: format!("hn:{id}"),
                title,
                body: body.unwrap_or_default(),
                link: url.unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={id}")),
            },
            RawCandidate::Discussion {
                id,
                community,
                title,
                body,
                permalink,
            } => Candidate {
                kind: SourceKind::Discussion,
                source: format!("r/{community}"),
                external_id: format!("reddit:{id}"),
                title,
                body,
                link: permalink,
            },
            RawCandidate::Opinion {
                source,
                title,
                summary,
                link,
                guid,
            } => {
                let key = guid.as_deref().unwrap_or(link.as_str());
                Candidate {
                    kind: SourceKind::Opinion,
                    external_id: format!("feed:{source}:{}", short_hash(key)),
                    source,
                    title,
                    body: summary,
                    link,
                }
            }
        }
    }
}

/// Candidate plus its generated summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedItem {
    pub candidate: Candidate,
    pub summary: String,
}

/// Final output of one run: accepted items in emission order plus one
/// cross-item synthesis. Handed off, never persisted.
#[derive(Debug, Clone)]
pub struct DailyReport {
    pub items: Vec<AcceptedItem>,
    pub synthesis: String,
}

/// Short stable digest for sources without a native id (12 hex chars).
pub fn short_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_is_stable_and_short() {
        let a = short_hash("https://example.test/post/1");
        let b = short_hash("https://example.test/post/1");
        let c = short_hash("https://example.test/post/2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 12);
    }

    #[test]
    fn external_ids_are_deterministic_per_source() {
        let sch = RawCandidate::Scholarly {
            id: "2401.01234".into(),
            title: "T".into(),
            abstract_text: "A".into(),
            link: "https://arxiv.org/abs/2401.01234".into(),
        };
        assert_eq!(sch.unify().external_id, "arxiv:2401.01234");

        let disc = RawCandidate::Discussion {
            id: "1abcd2".into(),
            community: "MachineLearning".into(),
            title: "T".into(),
            body: String::new(),
            permalink: "https://www.reddit.com/r/MachineLearning/comments/1abcd2/t/".into(),
        };
        let c = disc.unify();
        assert_eq!(c.external_id, "reddit:1abcd2");
        assert_eq!(c.source, "r/MachineLearning");
    }

    #[test]
    fn opinion_id_prefers_guid_over_link() {
        let with_guid = RawCandidate::Opinion {
            source: "Import AI".into(),
            title: "T".into(),
            summary: String::new(),
            link: "https://example.test/a?utm=x".into(),
            guid: Some("post-77".into()),
        };
        let without = RawCandidate::Opinion {
            source: "Import AI".into(),
            title: "T".into(),
            summary: String::new(),
            link: "https://example.test/a?utm=x".into(),
            guid: None,
        };
        assert_eq!(
            with_guid.unify().external_id,
            format!("feed:Import AI:{}", short_hash("post-77"))
        );
        assert_eq!(
            without.unify().external_id,
            format!("feed:Import AI:{}", short_hash("https://example.test/a?utm=x"))
        );
    }

    #[test]
    fn search_without_url_links_to_the_story_page() {
        let raw = RawCandidate::Search {
            id: "39210000".into(),
            title: "Ask HN".into(),
            url: None,
            body: Some("text".into()),
        };
        let c = raw.unify();
        assert_eq!(c.link, "https://news.ycombinator.com/item?id=39210000");
        assert_eq!(c.body, "text");
    }
}
