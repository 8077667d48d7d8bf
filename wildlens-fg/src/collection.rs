//! Collection persistence
//!
//! Saved species live in a single JSON snapshot on disk. Every mutation
//! rewrites the whole file from the in-memory records and only updates the
//! in-memory state after the write succeeds, so the snapshot never trails
//! what callers have been told. Records keep the camelCase field names of
//! the wire contract so the file is readable alongside gateway traffic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};
use wildlens_common::Result;

use crate::view::SpeciesCard;

/// Snapshot file name under the root folder
pub const SNAPSHOT_FILE: &str = "collection.json";

/// One saved species record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSpecies {
    /// Unique record id: the card id plus the save timestamp in millis
    #[serde(default)]
    pub id: String,

    /// Scientific name
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub common_name: String,

    /// Whole percent in 0..=100
    #[serde(default)]
    pub confidence: u8,

    /// Reference image URL for the species
    #[serde(default)]
    pub image: String,

    #[serde(rename = "class", default)]
    pub taxon_class: String,

    /// The user's own photo that produced the identification
    #[serde(default)]
    pub uploaded_image: String,

    pub saved_at: DateTime<Utc>,
}

/// Collection store backed by a JSON snapshot file
pub struct CollectionStore {
    path: PathBuf,
    records: Mutex<Vec<SavedSpecies>>,
}

impl CollectionStore {
    /// Open the store at the given snapshot path.
    ///
    /// A missing file is an empty collection; an unreadable or corrupt one is
    /// logged and treated as empty rather than failing the caller.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = load_snapshot(&path);
        Self {
            path,
            records: Mutex::new(records),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records in insertion order (oldest first)
    pub fn records(&self) -> Vec<SavedSpecies> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Save a card to the collection.
    ///
    /// The record id combines the card id with the save time in milliseconds;
    /// when that still collides (two saves of one card in the same
    /// millisecond) the timestamp component is bumped until unique. The
    /// snapshot is written before the record is committed in memory.
    pub fn save(
        &self,
        card: &SpeciesCard,
        uploaded_image: &str,
        now: DateTime<Utc>,
    ) -> Result<SavedSpecies> {
        let mut records = self.lock();

        let mut millis = now.timestamp_millis();
        let mut id = format!("{}-{}", card.id, millis);
        while records.iter().any(|record| record.id == id) {
            millis += 1;
            id = format!("{}-{}", card.id, millis);
        }

        let record = SavedSpecies {
            id,
            name: card.scientific_name.clone(),
            common_name: card.common_name.clone(),
            confidence: card.confidence,
            image: card.image.clone(),
            taxon_class: card.taxon_class.clone(),
            uploaded_image: uploaded_image.to_string(),
            saved_at: now,
        };

        let mut next = records.clone();
        next.push(record.clone());
        self.write_snapshot(&next)?;
        *records = next;

        debug!(id = %record.id, "Saved species to collection");
        Ok(record)
    }

    /// Delete the record with the given id.
    ///
    /// Returns whether a record was removed; the order of the remaining
    /// records is preserved.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.lock();

        let next: Vec<SavedSpecies> = records
            .iter()
            .filter(|record| record.id != id)
            .cloned()
            .collect();
        if next.len() == records.len() {
            return Ok(false);
        }

        self.write_snapshot(&next)?;
        *records = next;

        debug!(id = %id, "Deleted species from collection");
        Ok(true)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SavedSpecies>> {
        // A poisoned lock still holds consistent records; recover them
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Rewrite the snapshot from the full record list
    fn write_snapshot(&self, records: &[SavedSpecies]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(records)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Load records from the snapshot, dropping anything unusable
fn load_snapshot(path: &Path) -> Vec<SavedSpecies> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Vec::new(),
    };

    let items: Vec<serde_json::Value> = match serde_json::from_str(&content) {
        Ok(items) => items,
        Err(e) => {
            warn!("Corrupt collection snapshot {}: {e}", path.display());
            return Vec::new();
        }
    };

    let total = items.len();
    // Items are decoded individually so one bad record does not discard the
    // rest; records missing their identity fields cannot be displayed or
    // deleted and are dropped too
    let records: Vec<SavedSpecies> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .filter(|record: &SavedSpecies| !record.id.is_empty() && !record.common_name.is_empty())
        .collect();

    if records.len() < total {
        warn!(
            "Dropped {} unusable record(s) from {}",
            total - records.len(),
            path.display()
        );
    }

    records
}
