// src/seen.rs
//! Durable seen-id store: the single source of truth for "already reported".
//!
//! The backing record is one JSON snapshot `{seen_ids, last_updated}`. Every
//! `record()` rewrites the whole snapshot through a temp file + rename, so a
//! mid-run crash loses at most the item in flight. The set never shrinks.

use std::collections::HashSet;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct SeenRecord {
    seen_ids: Vec<String>,
    last_updated: DateTime<Utc>,
}

#[derive(Debug)]
pub struct SeenStore {
    path: PathBuf,
    // Insertion order kept for a readable file; the set backs `contains`.
    ids: Vec<String>,
    index: HashSet<String>,
}

impl SeenStore {
    /// Load from `path`. A missing or corrupt file yields an empty store
    /// (first-run semantics), never an error.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids = match fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str::<SeenRecord>(&s) {
                Ok(rec) => rec.seen_ids,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "seen store unreadable, starting empty");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        let index = ids.iter().cloned().collect();
        Self { path, ids, index }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Add `id` and synchronously rewrite the backing snapshot. Completes or
    /// errors before the caller moves on; a write failure must abort the run,
    /// otherwise every future run would re-notify this item.
    pub fn record(&mut self, id: &str) -> Result<()> {
        if self.index.insert(id.to_string()) {
            self.ids.push(id.to_string());
        }
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating storage dir {}", dir.display()))?;
            }
        }
        let rec = SeenRecord {
            seen_ids: self.ids.clone(),
            last_updated: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&rec).context("serializing seen store")?;
        write_atomic(&self.path, json.as_bytes())
            .with_context(|| format!("writing seen store {}", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let mut f = fs::File::create(&tmp)?;
    f.write_all(bytes)?;
    f.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeenStore::load(dir.path().join("seen_store.json"));
        assert!(store.is_empty());
        assert!(!store.contains("x"));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_store.json");
        fs::write(&path, "{not json").unwrap();
        let store = SeenStore::load(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn record_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_store.json");

        let mut store = SeenStore::load(&path);
        store.record("arxiv:2401.01234").unwrap();
        store.record("hn:39210000").unwrap();

        let reloaded = SeenStore::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("arxiv:2401.01234"));
        assert!(reloaded.contains("hn:39210000"));
    }

    #[test]
    fn record_is_idempotent_per_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SeenStore::load(dir.path().join("seen_store.json"));
        store.record("a").unwrap();
        store.record("a").unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn snapshot_has_expected_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen_store.json");
        let mut store = SeenStore::load(&path);
        store.record("feed:X:abc123").unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["seen_ids"][0], "feed:X:abc123");
        assert!(v["last_updated"].is_string());
    }

    #[test]
    fn creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/seen_store.json");
        let mut store = SeenStore::load(&path);
        store.record("a").unwrap();
        assert!(path.exists());
    }
}
