// src/config.rs
//! One immutable configuration value, built once at startup from a TOML file
//! and passed explicitly into every component. Secrets never live here; they
//! are read from the environment by the clients that need them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";
pub const ENV_CONFIG_PATH: &str = "RADAR_CONFIG_PATH";
pub const ENV_STORAGE_DIR: &str = "RADAR_STORAGE_DIR";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageCfg,
    pub relevance: RelevanceCfg,
    #[serde(default)]
    pub run: RunCfg,
    pub sources: SourcesCfg,
    #[serde(default)]
    pub enrich: EnrichCfg,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageCfg {
    #[serde(default = "default_storage_dir")]
    pub dir: String,
    #[serde(default = "default_storage_file")]
    pub file: String,
}

impl Default for StorageCfg {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            file: default_storage_file(),
        }
    }
}

impl StorageCfg {
    pub fn seen_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.file)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelevanceCfg {
    pub allow_terms: Vec<String>,
    #[serde(default)]
    pub block_terms: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunCfg {
    /// Hard cap on accepted items per run.
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Fixed delay between successive enrichment calls (third-party pacing).
    #[serde(default = "default_pace_ms")]
    pub pace_ms: u64,
    /// Collector priority order; earlier collectors win the cap tie-break.
    #[serde(default = "default_order")]
    pub order: Vec<String>,
}

impl Default for RunCfg {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            pace_ms: default_pace_ms(),
            order: default_order(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesCfg {
    pub arxiv: ArxivCfg,
    pub search: SearchCfg,
    pub discussion: DiscussionCfg,
    #[serde(default)]
    pub opinion: Vec<OpinionFeedCfg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArxivCfg {
    /// arXiv query expression, e.g. `cat:cs.AI AND abs:"medicine"`.
    pub query: String,
    #[serde(default = "default_scan_depth")]
    pub max_results: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchCfg {
    /// Free-text query for the story search endpoint.
    pub query: String,
    #[serde(default = "default_scan_depth")]
    pub max_results: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscussionCfg {
    /// Candidate communities; a per-run sample of `sample_size` is scanned.
    pub communities: Vec<String>,
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default = "default_scan_depth")]
    pub max_posts: usize,
    #[serde(default = "default_max_comments")]
    pub max_comments: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpinionFeedCfg {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrichCfg {
    #[serde(default = "default_cheap_model")]
    pub cheap_model: String,
    #[serde(default = "default_strong_model")]
    pub strong_model: String,
    /// Top-K web-search snippets gathered as auxiliary context.
    #[serde(default = "default_search_depth")]
    pub search_results: usize,
    /// Audience the "why this matters" framing is written for.
    #[serde(default = "default_audience")]
    pub audience: String,
}

impl Default for EnrichCfg {
    fn default() -> Self {
        Self {
            cheap_model: default_cheap_model(),
            strong_model: default_strong_model(),
            search_results: default_search_depth(),
            audience: default_audience(),
        }
    }
}

fn default_storage_dir() -> String {
    "storage".to_string()
}
fn default_storage_file() -> String {
    "seen_store.json".to_string()
}
fn default_max_items() -> usize {
    8
}
fn default_pace_ms() -> u64 {
    1_000
}
fn default_order() -> Vec<String> {
    ["scholarly", "search", "discussion", "opinion"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_scan_depth() -> usize {
    5
}
fn default_sample_size() -> usize {
    3
}
fn default_max_comments() -> usize {
    10
}
fn default_search_depth() -> usize {
    5
}
fn default_cheap_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_strong_model() -> String {
    "gpt-4o".to_string()
}
fn default_audience() -> String {
    "applied AI practitioners".to_string()
}

impl AppConfig {
    /// Resolve the config path ($RADAR_CONFIG_PATH or the default), read and
    /// parse it, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Parse from a TOML string (used by tests) and sanitize.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s).context("parsing config TOML")?;

        if let Ok(dir) = std::env::var(ENV_STORAGE_DIR) {
            if !dir.trim().is_empty() {
                cfg.storage.dir = dir;
            }
        }

        // Harden loaded values: the pipeline relies on these being sane.
        cfg.run.max_items = cfg.run.max_items.max(1);
        cfg.sources.arxiv.max_results = cfg.sources.arxiv.max_results.clamp(1, 50);
        cfg.sources.search.max_results = cfg.sources.search.max_results.clamp(1, 50);
        cfg.sources.discussion.max_posts = cfg.sources.discussion.max_posts.clamp(1, 50);
        cfg.sources.discussion.sample_size = cfg
            .sources
            .discussion
            .sample_size
            .clamp(1, cfg.sources.discussion.communities.len().max(1));

        anyhow::ensure!(
            !cfg.relevance.allow_terms.is_empty(),
            "relevance.allow_terms must not be empty (default-deny would reject everything)"
        );

        Ok(cfg)
    }
}
