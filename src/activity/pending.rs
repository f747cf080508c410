use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An activity record that could not be delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingActivity {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
    /// RFC 3339 time the activity was logged.
    pub timestamp: String,
    #[serde(default = "default_true")]
    pub pending: bool,
}

fn default_true() -> bool {
    true
}

/// Bounded, file-backed ring buffer of undelivered activity records.
///
/// The whole buffer is one JSON array. Pushing past capacity evicts the
/// oldest records first. A missing or corrupt file reads as empty.
#[derive(Debug)]
pub struct PendingStore {
    path: PathBuf,
    capacity: usize,
    // Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl PendingStore {
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity,
            guard: Mutex::new(()),
        }
    }

    /// Default location: `~/.healthsync/pending-activities.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".healthsync").join("pending-activities.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a record, evicting the oldest past capacity.
    pub fn push(&self, activity: PendingActivity) -> Result<()> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entries: VecDeque<PendingActivity> = self.read().into();
        entries.push_back(activity);
        while entries.len() > self.capacity {
            entries.pop_front();
        }

        self.write(entries.make_contiguous())
    }

    /// All buffered records, oldest first.
    pub fn entries(&self) -> Vec<PendingActivity> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        self.read()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every buffered record. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = self.read().len();
        self.write(&[])?;
        Ok(removed)
    }

    fn read(&self) -> Vec<PendingActivity> {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    fn write(&self, entries: &[PendingActivity]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("failed to create pending activity directory")?;
        }
        let json = serde_json::to_string(entries).context("failed to serialize pending activities")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}
