// src/relevance.rs
//! Keyword relevance gate: a pure accept/reject decision over an item's text.
//!
//! Block terms have absolute precedence over allow terms; with neither list
//! matching, the item is rejected. Upstream queries are noisy, so an explicit
//! positive signal is required (default-deny).

/// Outcome of one classification, with the term that decided it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept { matched: String },
    Block { matched: String },
    NoSignal,
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept { .. })
    }
}

#[derive(Debug, Clone)]
pub struct KeywordFilter {
    allow: Vec<String>,
    block: Vec<String>,
}

impl KeywordFilter {
    /// Terms are trimmed, lower-cased and deduplicated; empties are dropped.
    pub fn new(allow: &[String], block: &[String]) -> Self {
        Self {
            allow: clean_terms(allow),
            block: clean_terms(block),
        }
    }

    /// Classify concatenated title+body. Matching is lower-cased substring
    /// containment; an empty body simply leaves the title to decide.
    pub fn classify(&self, title: &str, body: &str) -> Verdict {
        let text = format!("{} {}", title, body).to_lowercase();

        if let Some(hit) = self.block.iter().find(|t| text.contains(t.as_str())) {
            return Verdict::Block {
                matched: hit.clone(),
            };
        }
        if let Some(hit) = self.allow.iter().find(|t| text.contains(t.as_str())) {
            return Verdict::Accept {
                matched: hit.clone(),
            };
        }
        Verdict::NoSignal
    }

    pub fn is_relevant(&self, title: &str, body: &str) -> bool {
        self.classify(title, body).is_accept()
    }

    /// Coarse gate used by collectors that pre-filter before emitting:
    /// any allow term present, ignoring the block list.
    pub fn has_allow_signal(&self, text: &str) -> bool {
        let t = text.to_lowercase();
        self.allow.iter().any(|a| t.contains(a.as_str()))
    }

    pub fn allow_terms(&self) -> &[String] {
        &self.allow
    }

    pub fn block_terms(&self) -> &[String] {
        &self.block
    }
}

fn clean_terms(terms: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(terms.len());
    for t in terms {
        let t = t.trim().to_lowercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> KeywordFilter {
        KeywordFilter::new(
            &["marketing".into(), "machine learning".into()],
            &["cancer".into(), "crypto".into()],
        )
    }

    #[test]
    fn block_wins_over_any_number_of_allow_hits() {
        let f = filter();
        let v = f.classify(
            "Machine learning for marketing",
            "a crypto angle sneaks in",
        );
        assert_eq!(
            v,
            Verdict::Block {
                matched: "crypto".into()
            }
        );
    }

    #[test]
    fn allow_term_accepts_when_unblocked() {
        let f = filter();
        assert!(f.is_relevant("New marketing study", ""));
    }

    #[test]
    fn default_deny_without_any_signal() {
        let f = filter();
        assert_eq!(f.classify("Weather report", "sunny all week"), Verdict::NoSignal);
        assert!(!f.is_relevant("Weather report", "sunny all week"));
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let f = filter();
        assert!(f.is_relevant("MACHINE LEARNING breakthrough", ""));
        // substring semantics: "remarketing" contains "marketing"
        assert!(f.is_relevant("remarketing tools", ""));
    }

    #[test]
    fn empty_body_runs_against_title_only() {
        let f = filter();
        assert_eq!(
            f.classify("cancer screening update", ""),
            Verdict::Block {
                matched: "cancer".into()
            }
        );
    }

    #[test]
    fn terms_are_cleaned_on_construction() {
        let f = KeywordFilter::new(
            &["  LLM ".into(), "llm".into(), "".into()],
            &[],
        );
        assert_eq!(f.allow_terms(), &["llm".to_string()]);
        assert!(f.has_allow_signal("An LLM benchmark"));
    }
}
