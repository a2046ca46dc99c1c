use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::CacheRecord;

pub(crate) const LRU_INDEX: &str = "LRUIndex";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("cache snapshot is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("cache snapshot root must be a JSON object")]
    NotAnObject,
}

/// One persisted node. `index` is its recency position, 0 being the most
/// recently used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub key: String,
    pub index: usize,
    pub record: CacheRecord,
}

/// Typed view of the on-disk cache file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskSnapshot {
    entries: Vec<SnapshotEntry>,
}

#[derive(Serialize, Deserialize)]
struct PersistedRecord {
    #[serde(flatten)]
    record: CacheRecord,
    #[serde(rename = "LRUIndex")]
    lru_index: String,
}

impl DiskSnapshot {
    pub fn new(entries: Vec<SnapshotEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<SnapshotEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses the cache file. Individual entries that are malformed are
    /// skipped; only a file that is not a JSON object at all is an error.
    pub fn parse(text: &str) -> Result<Self, SnapshotError> {
        let root: Value = serde_json::from_str(text)?;
        let Value::Object(map) = root else {
            return Err(SnapshotError::NotAnObject);
        };

        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            if !value.is_object() {
                warn!(key = %key, "skipping cache entry that is not an object");
                continue;
            }
            let persisted: PersistedRecord = match serde_json::from_value(value) {
                Ok(persisted) => persisted,
                Err(err) => {
                    warn!(key = %key, error = %err, "skipping malformed cache entry");
                    continue;
                }
            };
            let index = match persisted.lru_index.trim().parse::<usize>() {
                Ok(index) => index,
                Err(_) => {
                    warn!(
                        key = %key,
                        index = %persisted.lru_index,
                        "skipping cache entry with invalid {LRU_INDEX}"
                    );
                    continue;
                }
            };
            entries.push(SnapshotEntry {
                key,
                index,
                record: persisted.record,
            });
        }
        Ok(Self { entries })
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        let map: BTreeMap<&str, PersistedRecord> = self
            .entries
            .iter()
            .map(|entry| {
                (
                    entry.key.as_str(),
                    PersistedRecord {
                        record: entry.record.clone(),
                        lru_index: entry.index.to_string(),
                    },
                )
            })
            .collect();
        Ok(serde_json::to_string(&map)?)
    }
}
