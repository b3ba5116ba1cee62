//! Persisted photo records
//!
//! A single JSON document keyed by file name. Saving writes a temporary file
//! next to the target and renames it into place.

use crate::error::{Error, Result};
use crate::photo::PhotoRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Record store keyed by file name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordStore {
    /// Version for store file format compatibility
    version: u32,

    /// Last time the store was saved
    updated_at: Option<DateTime<Utc>>,

    records: BTreeMap<String, PhotoRecord>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    /// Current store file format version
    const VERSION: u32 = 1;

    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            updated_at: None,
            records: BTreeMap::new(),
        }
    }

    /// Load the store, starting empty if the file does not exist yet.
    ///
    /// A file written by an incompatible version is an error rather than
    /// being silently replaced.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(?path, "Record store does not exist, starting empty");
            return Ok(Self::new());
        }

        let file = File::open(path)
            .map_err(|e| Error::Store(format!("Failed to open record store: {}", e)))?;
        let reader = BufReader::new(file);

        let store: Self = serde_json::from_reader(reader)
            .map_err(|e| Error::Store(format!("Failed to parse record store: {}", e)))?;

        if store.version != Self::VERSION {
            warn!(
                store_version = store.version,
                current_version = Self::VERSION,
                "Record store version mismatch"
            );
            return Err(Error::Store(format!(
                "Unsupported record store version {} in {}",
                store.version,
                path.display()
            )));
        }

        info!(records = store.records.len(), ?path, "Loaded record store");
        Ok(store)
    }

    /// Save the store atomically
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.updated_at = Some(Utc::now());

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");

        let file = File::create(&temp_path)
            .map_err(|e| Error::Store(format!("Failed to create temp record store: {}", e)))?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| Error::Store(format!("Failed to write record store: {}", e)))?;
        writer
            .flush()
            .map_err(|e| Error::Store(format!("Failed to write record store: {}", e)))?;
        drop(writer);

        fs::rename(&temp_path, path)
            .map_err(|e| Error::Store(format!("Failed to rename temp record store: {}", e)))?;

        info!(records = self.records.len(), ?path, "Saved record store");
        Ok(())
    }

    /// Whether a record with this file name exists
    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Insert or replace the record with the same name.
    ///
    /// Returns `true` when the name was not present before.
    pub fn upsert(&mut self, record: PhotoRecord) -> bool {
        self.records.insert(record.name.clone(), record).is_none()
    }

    pub fn get(&self, name: &str) -> Option<&PhotoRecord> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
