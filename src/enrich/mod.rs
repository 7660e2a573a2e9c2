// src/enrich/mod.rs
pub mod client;
pub mod format;

use std::sync::Arc;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::collect::reddit::{ThreadFetch, ThreadFetcher};
use crate::item::{AcceptedItem, Candidate, SourceKind};
use crate::search::SearchClient;
use self::client::{GenClient, Profile};
use self::format::normalize_generated;

/// Fixed fallback texts: enrichment failure never aborts an item or the run.
pub const FALLBACK_SUMMARY: &str = "Summary unavailable (generation failed).";
pub const FALLBACK_SYNTHESIS: &str =
    "Synthesis unavailable (generation failed); see the individual items above.";
pub const NO_CONTEXT_PLACEHOLDER: &str = "No extra context available.";

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "scan_enrich_fallback_total",
            "Items that received the fixed fallback summary."
        );
        describe_counter!(
            "scan_context_misses_total",
            "Auxiliary-context lookups that degraded to the placeholder."
        );
    });
}

pub struct Enricher {
    gen: Arc<dyn GenClient>,
    search: Arc<dyn SearchClient>,
    threads: Arc<dyn ThreadFetcher>,
    search_depth: usize,
    audience: String,
}

impl Enricher {
    pub fn new(
        gen: Arc<dyn GenClient>,
        search: Arc<dyn SearchClient>,
        threads: Arc<dyn ThreadFetcher>,
        search_depth: usize,
        audience: impl Into<String>,
    ) -> Self {
        ensure_metrics_described();
        Self {
            gen,
            search,
            threads,
            search_depth,
            audience: audience.into(),
        }
    }

    /// Produce one item's summary. Any generation or context failure degrades
    /// to a fixed fallback; this function never errors.
    pub async fn summarize(&self, candidate: &Candidate) -> String {
        let prompt = self.build_prompt(candidate).await;
        match self.gen.generate(&prompt, Profile::Cheap).await {
            Ok(text) if !text.trim().is_empty() => normalize_generated(&text),
            Ok(_) => {
                counter!("scan_enrich_fallback_total").increment(1);
                FALLBACK_SUMMARY.to_string()
            }
            Err(e) => {
                tracing::warn!(
                    target: "enrich",
                    error = %e,
                    id = %candidate.external_id,
                    "per-item generation failed, using fallback"
                );
                counter!("scan_enrich_fallback_total").increment(1);
                FALLBACK_SUMMARY.to_string()
            }
        }
    }

    /// One strong-profile pass over the whole accepted batch.
    pub async fn synthesize(&self, items: &[AcceptedItem]) -> String {
        let listing = items
            .iter()
            .map(|it| {
                format!(
                    "- [{}] {}: {}",
                    it.candidate.source,
                    it.candidate.title,
                    first_line(&it.summary)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Today's accepted items, in report order:\n{listing}\n\n\
             Write a short synthesis for {audience}: group related items, name \
             the thread connecting them, and state the practical implications. \
             Start with 'Implications:' and keep it under 120 words.",
            audience = self.audience,
        );

        match self.gen.generate(&prompt, Profile::Strong).await {
            Ok(text) if !text.trim().is_empty() => normalize_generated(&text),
            Ok(_) => FALLBACK_SYNTHESIS.to_string(),
            Err(e) => {
                tracing::warn!(target: "enrich", error = %e, "synthesis generation failed, using fallback");
                FALLBACK_SYNTHESIS.to_string()
            }
        }
    }

    async fn build_prompt(&self, c: &Candidate) -> String {
        let audience = &self.audience;
        match c.kind {
            SourceKind::Scholarly => format!(
                "Summarize this paper in two sentences for {audience}, then add \
                 one 'Why it matters:' line.\n\nTitle: {}\nAbstract: {}",
                c.title,
                non_empty(&c.body, "(no abstract available)"),
            ),
            SourceKind::Opinion => format!(
                "Summarize this newsletter piece in two sentences for {audience}, \
                 then add one 'Why it matters:' line.\n\nSource: {}\nTitle: {}\nExcerpt: {}",
                c.source,
                c.title,
                non_empty(&c.body, "(no excerpt available)"),
            ),
            SourceKind::Search => {
                let context = self.search_context(&c.title).await;
                format!(
                    "Summarize this story in two sentences for {audience}, then \
                     add one 'Why it matters:' line.\n\nTitle: {}\nStory text: {}\n\
                     Search context:\n{context}",
                    c.title,
                    non_empty(&c.body, "(link-only story)"),
                )
            }
            SourceKind::Discussion => {
                let context = self.thread_context(c).await;
                format!(
                    "Summarize this discussion thread in two sentences for \
                     {audience}: what is being discussed and the prevailing \
                     view. Then add one 'Why it matters:' line.\n\n\
                     Community: {}\nTitle: {}\n{context}",
                    c.source, c.title,
                )
            }
        }
    }

    async fn search_context(&self, title: &str) -> String {
        match self.search.search(title, self.search_depth).await {
            Ok(snippets) if !snippets.is_empty() => snippets
                .iter()
                .map(|s| format!("- {}: {}", s.title, s.snippet))
                .collect::<Vec<_>>()
                .join("\n"),
            Ok(_) => {
                counter!("scan_context_misses_total").increment(1);
                NO_CONTEXT_PLACEHOLDER.to_string()
            }
            Err(e) => {
                tracing::warn!(target: "enrich", error = %e, "search context failed");
                counter!("scan_context_misses_total").increment(1);
                NO_CONTEXT_PLACEHOLDER.to_string()
            }
        }
    }

    /// Thread context: deep-fetch the post and top comments; a blocked fetch
    /// falls back to a web search on the thread title.
    async fn thread_context(&self, c: &Candidate) -> String {
        match self.threads.fetch_thread(&c.link).await {
            ThreadFetch::Fetched(detail) => {
                let post = non_empty(&detail.post_text, "(link post, no text)").to_string();
                if detail.comments.is_empty() {
                    format!("Post: {post}\nComments: (none)")
                } else {
                    format!(
                        "Post: {post}\nTop comments:\n{}",
                        detail
                            .comments
                            .iter()
                            .map(|b| format!("- {b}"))
                            .collect::<Vec<_>>()
                            .join("\n")
                    )
                }
            }
            ThreadFetch::Blocked => {
                tracing::debug!(target: "enrich", link = %c.link, "thread blocked, falling back to web search");
                format!("Search context:\n{}", self.search_context(&c.title).await)
            }
        }
    }
}

fn non_empty<'a>(s: &'a str, placeholder: &'a str) -> &'a str {
    if s.trim().is_empty() {
        placeholder
    } else {
        s
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::reddit::ThreadDetail;
    use crate::search::SearchSnippet;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every prompt; replies fixed text or errors.
    struct RecordingGen {
        prompts: Mutex<Vec<(String, Profile)>>,
        fail: bool,
    }

    impl RecordingGen {
        fn ok() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail: false,
            }
        }
        fn failing() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                fail: true,
            }
        }
        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().unwrap().0.clone()
        }
    }

    #[async_trait]
    impl GenClient for RecordingGen {
        async fn generate(&self, prompt: &str, profile: Profile) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), profile));
            if self.fail {
                anyhow::bail!("provider down")
            }
            Ok("**Summary:** generated text".to_string())
        }
        fn provider_name(&self) -> &'static str {
            "recording"
        }
    }

    struct NoSearch;
    #[async_trait]
    impl SearchClient for NoSearch {
        async fn search(&self, _q: &str, _l: usize) -> Result<Vec<SearchSnippet>> {
            anyhow::bail!("no key")
        }
    }

    struct SomeSearch;
    #[async_trait]
    impl SearchClient for SomeSearch {
        async fn search(&self, _q: &str, _l: usize) -> Result<Vec<SearchSnippet>> {
            Ok(vec![SearchSnippet {
                title: "ctx".into(),
                snippet: "snippet".into(),
            }])
        }
    }

    struct OpenThreads;
    #[async_trait]
    impl ThreadFetcher for OpenThreads {
        async fn fetch_thread(&self, _p: &str) -> ThreadFetch {
            ThreadFetch::Fetched(ThreadDetail {
                post_text: "the post".into(),
                comments: vec!["c1".into(), "c2".into()],
            })
        }
    }

    struct BlockedThreads;
    #[async_trait]
    impl ThreadFetcher for BlockedThreads {
        async fn fetch_thread(&self, _p: &str) -> ThreadFetch {
            ThreadFetch::Blocked
        }
    }

    fn candidate(kind: SourceKind) -> Candidate {
        Candidate {
            kind,
            source: "r/test".into(),
            external_id: "x:1".into(),
            title: "A title".into(),
            body: "A body".into(),
            link: "https://example.test/t".into(),
        }
    }

    fn enricher(
        gen: Arc<RecordingGen>,
        search: Arc<dyn SearchClient>,
        threads: Arc<dyn ThreadFetcher>,
    ) -> Enricher {
        Enricher::new(gen, search, threads, 3, "applied AI practitioners")
    }

    #[tokio::test]
    async fn failure_yields_fixed_fallback() {
        let gen = Arc::new(RecordingGen::failing());
        let e = enricher(gen, Arc::new(NoSearch), Arc::new(OpenThreads));
        let out = e.summarize(&candidate(SourceKind::Scholarly)).await;
        assert_eq!(out, FALLBACK_SUMMARY);
    }

    #[tokio::test]
    async fn generated_text_is_normalized() {
        let gen = Arc::new(RecordingGen::ok());
        let e = enricher(gen, Arc::new(NoSearch), Arc::new(OpenThreads));
        let out = e.summarize(&candidate(SourceKind::Scholarly)).await;
        assert_eq!(out, "*Summary:* generated text");
    }

    #[tokio::test]
    async fn discussion_prompt_carries_thread_comments() {
        let gen = Arc::new(RecordingGen::ok());
        let e = enricher(gen.clone(), Arc::new(NoSearch), Arc::new(OpenThreads));
        e.summarize(&candidate(SourceKind::Discussion)).await;
        let prompt = gen.last_prompt();
        assert!(prompt.contains("the post"));
        assert!(prompt.contains("- c1"));
    }

    #[tokio::test]
    async fn blocked_thread_falls_back_to_search_context() {
        let gen = Arc::new(RecordingGen::ok());
        let e = enricher(gen.clone(), Arc::new(SomeSearch), Arc::new(BlockedThreads));
        e.summarize(&candidate(SourceKind::Discussion)).await;
        let prompt = gen.last_prompt();
        assert!(prompt.contains("- ctx: snippet"));
    }

    #[tokio::test]
    async fn context_failure_degrades_to_placeholder() {
        let gen = Arc::new(RecordingGen::ok());
        let e = enricher(gen.clone(), Arc::new(NoSearch), Arc::new(BlockedThreads));
        e.summarize(&candidate(SourceKind::Search)).await;
        assert!(gen.last_prompt().contains(NO_CONTEXT_PLACEHOLDER));
    }

    #[tokio::test]
    async fn synthesis_uses_strong_profile_and_falls_back() {
        let gen = Arc::new(RecordingGen::ok());
        let e = enricher(gen.clone(), Arc::new(NoSearch), Arc::new(OpenThreads));
        let items = vec![AcceptedItem {
            candidate: candidate(SourceKind::Search),
            summary: "line one\nline two".into(),
        }];
        e.synthesize(&items).await;
        {
            let prompts = gen.prompts.lock().unwrap();
            let (prompt, profile) = prompts.last().unwrap();
            assert_eq!(*profile, Profile::Strong);
            assert!(prompt.contains("line one"));
            assert!(!prompt.contains("line two"));
        }

        let failing = Arc::new(RecordingGen::failing());
        let e = enricher(failing, Arc::new(NoSearch), Arc::new(OpenThreads));
        assert_eq!(e.synthesize(&items).await, FALLBACK_SYNTHESIS);
    }
}
