//! Recap persistence on the local filesystem.

use anyhow::{Context, Result};
use selfit_core::recap::{RecapData, RecapPatch, RecapStore, STORAGE_KEY};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File-backed store keeping the one recap record as pretty-printed JSON
/// under the record's storage key. Saves are read-merge-write, matching the
/// in-memory store's semantics.
pub struct JsonFileRecapStore {
    path: PathBuf,
    /// Serializes the read-merge-write cycle between tasks.
    lock: Mutex<()>,
}

impl JsonFileRecapStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(format!("{STORAGE_KEY}.json")),
            lock: Mutex::new(()),
        }
    }

    fn read_record(&self) -> Result<RecapData> {
        if !self.path.is_file() {
            return Ok(RecapData::seeded());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read recap file: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse recap file: {}", self.path.display()))
    }

    fn write_record(&self, record: &RecapData) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(record).context("Failed to serialize recap")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write recap file: {}", self.path.display()))
    }
}

impl RecapStore for JsonFileRecapStore {
    fn load(&self) -> Result<RecapData> {
        let _guard = self.lock.lock().expect("recap store poisoned");
        self.read_record()
    }

    fn save(&self, patch: RecapPatch) -> Result<()> {
        let _guard = self.lock.lock().expect("recap store poisoned");
        let current = self.read_record()?;
        self.write_record(&current.merged(patch))
    }
}
