//! Rolling measurement history
//!
//! Every served acquisition appends `(temperature, humiditeSol, timestamp)`
//! to a bounded, JSON-file-backed history used by the dashboard charts.

use crate::config::HistoryConfig;
use crate::error::{Result, SerreError};
use crate::logging::get_logger;
use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// One persisted measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub temperature: Option<f64>,
    #[serde(rename = "humiditeSol")]
    pub average_humidity: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl From<&Snapshot> for HistoryEntry {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            temperature: snapshot.temperature(),
            average_humidity: snapshot.average_humidity(),
            timestamp: snapshot.timestamp(),
        }
    }
}

/// Bounded history persisted as a JSON array
pub struct HistoryStore {
    file_path: PathBuf,
    max_entries: usize,
    entries: Mutex<VecDeque<HistoryEntry>>,
    logger: crate::logging::StructuredLogger,
}

impl HistoryStore {
    /// Create an empty store writing to `file_path`
    pub fn new<P: AsRef<Path>>(file_path: P, max_entries: usize) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            max_entries: max_entries.max(1),
            entries: Mutex::new(VecDeque::new()),
            logger: get_logger("history"),
        }
    }

    /// Open the store described by `config`, loading existing entries
    pub async fn open(config: &HistoryConfig) -> Result<Self> {
        let store = Self::new(&config.file, config.max_entries);
        store.load().await?;
        Ok(store)
    }

    /// Load entries from disk; a missing file means an empty history
    pub async fn load(&self) -> Result<()> {
        let contents = match tokio::fs::read_to_string(&self.file_path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.logger.info("No history file found, starting empty");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let mut loaded: Vec<HistoryEntry> = serde_json::from_str(&contents)?;
        loaded.sort_by_key(|e| e.timestamp);
        let excess = loaded.len().saturating_sub(self.max_entries);

        let mut entries = self.entries.lock().await;
        *entries = loaded.into_iter().skip(excess).collect();
        self.logger
            .info(&format!("Loaded {} history entries", entries.len()));
        Ok(())
    }

    /// Append a snapshot and persist the history
    pub async fn record(&self, snapshot: &Snapshot) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.push_back(HistoryEntry::from(snapshot));
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
        // Persist while holding the lock so concurrent writers cannot
        // interleave partial files
        self.save_locked(&entries).await
    }

    /// Entries recorded at or after `since`, oldest first
    pub async fn since(&self, since: DateTime<Utc>) -> Vec<HistoryEntry> {
        let entries = self.entries.lock().await;
        entries
            .iter()
            .filter(|e| e.timestamp >= since)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Write the current history to disk
    pub async fn save(&self) -> Result<()> {
        let entries = self.entries.lock().await;
        self.save_locked(&entries).await
    }

    async fn save_locked(&self, entries: &VecDeque<HistoryEntry>) -> Result<()> {
        let contents = serde_json::to_vec(entries)?;
        write_atomically(&self.file_path, &contents).await?;
        self.logger.debug("Saved history to disk");
        Ok(())
    }
}

/// Write through a temporary sibling file and rename it into place
pub(crate) async fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| {
        SerreError::storage(format!("Cannot replace {}: {}", path.display(), e))
    })
}
