//! Analysis history persistence.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::providers::AnalysisStore;
use crate::types::AnalysisRecord;
use crate::Result;

/// Analysis history kept in memory and persisted as a JSON array.
#[derive(Debug)]
pub struct JsonFileStore {
    /// Path to the history JSON file (empty for in-memory)
    path: PathBuf,
    /// Records, oldest first
    records: Vec<AnalysisRecord>,
}

impl JsonFileStore {
    /// Open the store at the default path.
    ///
    /// Default path: `~/.tradegate/history.json`
    /// Can be overridden with `TRADEGATE_HISTORY_FILE` environment variable.
    pub fn new() -> Result<Self> {
        Self::with_path(Self::default_path())
    }

    /// Open a store at a custom path. A missing file starts empty.
    pub fn with_path(path: PathBuf) -> Result<Self> {
        let records = Self::load_from_path(&path)?;
        Ok(Self { path, records })
    }

    /// Create an in-memory store (no persistence).
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            records: Vec::new(),
        }
    }

    /// Get the default history file path.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("TRADEGATE_HISTORY_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".tradegate/history.json"))
            .unwrap_or_else(|| PathBuf::from("history.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn load_from_path(path: &Path) -> Result<Vec<AnalysisRecord>> {
        if path.as_os_str().is_empty() || !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Write all records to disk.
    pub fn save(&self) -> Result<()> {
        // Skip if in-memory only
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl AnalysisStore for JsonFileStore {
    fn create(&mut self, record: AnalysisRecord) -> Result<()> {
        tracing::info!(id = %record.id, symbol = %record.config.symbol, "Saving analysis record");
        self.records.push(record);
        if let Err(e) = self.save() {
            // Keep memory in step with what is on disk
            self.records.pop();
            return Err(e);
        }
        Ok(())
    }

    fn latest(&self, limit: usize) -> Result<Vec<AnalysisRecord>> {
        let mut records: Vec<AnalysisRecord> = self.records.clone();
        // Stable sort keeps insertion order for equal timestamps; reverse
        // afterwards so later inserts win ties.
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        records.reverse();
        records.truncate(limit);
        Ok(records)
    }
}
