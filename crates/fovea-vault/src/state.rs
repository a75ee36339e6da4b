//! Persistent scan state.
//!
//! A JSON file under `<vault>/.fovea/state.json` holding the set of
//! processed asset IDs, cumulative counters, and the last scan time. It is
//! a cache over the vault, not the source of truth: deleting it only costs
//! a full re-classification pass, never duplicate notes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use fovea_core::models::ScanStats;
use fovea_core::{Error, Result};

/// The on-disk state document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PersistentState {
    /// Asset IDs that have completed the pipeline (written or skipped).
    #[serde(default)]
    pub processed_ids: BTreeSet<String>,
    /// Cumulative counters across all scans.
    #[serde(default)]
    pub stats: ScanStats,
    /// When the last scan finished.
    #[serde(default)]
    pub last_scan_date: Option<DateTime<Utc>>,
}

/// Loads and persists [`PersistentState`] at a fixed path.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    state: PersistentState,
}

impl StateStore {
    /// Load state from `path`. A missing file yields fresh state; a file
    /// that exists but does not parse is an error so the caller can decide
    /// whether to start over.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                Error::State(format!("corrupt state file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no state file, starting fresh");
                PersistentState::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, state })
    }

    /// Fresh state at `path`, ignoring anything on disk.
    pub fn fresh(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: PersistentState::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_processed(&self, asset_id: &str) -> bool {
        self.state.processed_ids.contains(asset_id)
    }

    /// Record an asset as processed. Returns true when it was new.
    pub fn mark_processed(&mut self, asset_id: &str) -> bool {
        self.state.processed_ids.insert(asset_id.to_string())
    }

    pub fn processed_count(&self) -> usize {
        self.state.processed_ids.len()
    }

    pub fn stats(&self) -> &ScanStats {
        &self.state.stats
    }

    pub fn stats_mut(&mut self) -> &mut ScanStats {
        &mut self.state.stats
    }

    pub fn set_last_scan(&mut self, at: DateTime<Utc>) {
        self.state.last_scan_date = Some(at);
    }

    pub fn last_scan(&self) -> Option<DateTime<Utc>> {
        self.state.last_scan_date
    }

    /// Persist atomically (temp file then rename).
    pub fn save(&self) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::State(format!("no parent directory: {}", self.path.display())))?;
        std::fs::create_dir_all(parent)?;
        let json = serde_json::to_string_pretty(&self.state)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .map_err(|e| Error::State(format!("rename into {} failed: {}", self.path.display(), e)))?;
        debug!(path = %self.path.display(), processed = self.processed_count(), "state saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::load(dir.path().join(".fovea/state.json")).unwrap();
        assert_eq!(store.processed_count(), 0);
        assert!(store.last_scan().is_none());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".fovea/state.json");
        let mut store = StateStore::load(&path).unwrap();
        assert!(store.mark_processed("A1"));
        assert!(!store.mark_processed("A1"));
        store.stats_mut().written += 3;
        store.set_last_scan("2026-02-07T10:00:00Z".parse().unwrap());
        store.save().unwrap();

        let reloaded = StateStore::load(&path).unwrap();
        assert!(reloaded.is_processed("A1"));
        assert!(!reloaded.is_processed("A2"));
        assert_eq!(reloaded.stats().written, 3);
        assert!(reloaded.last_scan().is_some());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = StateStore::load(&path).unwrap_err();
        assert!(matches!(err, Error::State(_)));
    }

    #[test]
    fn test_missing_fields_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"processed_ids": ["X"]}"#).unwrap();
        let store = StateStore::load(&path).unwrap();
        assert!(store.is_processed("X"));
        assert_eq!(store.stats().errors, 0);
        assert!(store.last_scan().is_none());
    }

    #[test]
    fn test_fresh_ignores_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "garbage").unwrap();
        let store = StateStore::fresh(&path);
        assert_eq!(store.processed_count(), 0);
    }
}
