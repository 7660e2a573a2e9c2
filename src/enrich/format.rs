// src/enrich/format.rs
//! Cleanup of generated text before it reaches the notification sink, which
//! is a dumb renderer. One pure function, driven by fixed tables.

use once_cell::sync::OnceCell;

/// Section labels the models are prompted to use, mapped to the sink's
/// display-emphasis form.
const LABEL_MAP: &[(&str, &str)] = &[
    ("Summary:", "*Summary:*"),
    ("Why it matters:", "*Why it matters:*"),
    ("Key points:", "*Key points:*"),
    ("Implications:", "*Implications:*"),
];

/// Strip structural emphasis the delivery channel does not support and map
/// recognized section labels to its single-asterisk emphasis.
pub fn normalize_generated(text: &str) -> String {
    // Double-markers first, so "**Summary:**" reduces to the bare label
    // before the label table runs.
    let mut out = text.replace("**", "").replace("__", "");

    static RE_HEADING: OnceCell<regex::Regex> = OnceCell::new();
    let re_heading = RE_HEADING.get_or_init(|| regex::Regex::new(r"(?m)^\s{0,3}#{1,6}\s+").unwrap());
    out = re_heading.replace_all(&out, "").to_string();

    for (label, display) in LABEL_MAP {
        out = out.replace(label, display);
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bold_and_maps_labels() {
        let raw = "**Summary:** A new benchmark.\n**Why it matters:** It changes evals.";
        assert_eq!(
            normalize_generated(raw),
            "*Summary:* A new benchmark.\n*Why it matters:* It changes evals."
        );
    }

    #[test]
    fn strips_markdown_headings() {
        let raw = "## Overview\nSome text\n   ### Details\nMore";
        assert_eq!(normalize_generated(raw), "Overview\nSome text\nDetails\nMore");
    }

    #[test]
    fn bare_labels_still_get_emphasis() {
        let raw = "Summary: plain label without markup.";
        assert_eq!(normalize_generated(raw), "*Summary:* plain label without markup.");
    }

    #[test]
    fn unmarked_text_passes_through_trimmed() {
        assert_eq!(normalize_generated("  plain sentence  "), "plain sentence");
    }

    #[test]
    fn underscore_emphasis_is_stripped() {
        assert_eq!(normalize_generated("__really__ plain"), "really plain");
    }
}
