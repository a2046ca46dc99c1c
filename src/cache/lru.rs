use lru::LruCache as LruList;
use parking_lot::Mutex;
use tracing::{trace, warn};

use super::CacheRecord;
use super::snapshot::{DiskSnapshot, SnapshotEntry};

/// Size-bounded LRU map from cache key to [`CacheRecord`].
///
/// Capacity is measured in the summed [`CacheRecord::size`] of every held
/// record. Each public operation takes the single internal lock for its whole
/// duration.
#[derive(Debug)]
pub struct LruCache {
    inner: Mutex<LruState>,
}

#[derive(Debug)]
struct LruState {
    // Unbounded on entry count; eviction is driven by `size` below.
    nodes: LruList<String, CacheRecord>,
    size: usize,
    capacity: usize,
}

impl LruState {
    fn evict_to_capacity(&mut self) {
        while self.size > self.capacity {
            let Some((key, record)) = self.nodes.pop_lru() else {
                break;
            };
            self.size = self.size.saturating_sub(record.size());
            trace!(key = %key, size = record.size(), "evicted cache entry");
            crate::metrics::record_cache_eviction();
        }
    }

    fn put(&mut self, key: String, record: CacheRecord) {
        let size = record.size();
        if size == 0 || size > self.capacity {
            warn!(
                size,
                capacity = self.capacity,
                "cache record is empty or larger than capacity; not inserted"
            );
            crate::metrics::record_cache_rejected();
            return;
        }

        if let Some(previous) = self.nodes.put(key, record) {
            self.size = self.size.saturating_sub(previous.size());
        }
        self.size += size;
        self.evict_to_capacity();
    }
}

impl LruCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruState {
                nodes: LruList::unbounded(),
                size: 0,
                capacity,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    /// Changes the capacity, evicting least recently used entries if the
    /// cache no longer fits.
    pub fn set_capacity(&self, capacity: usize) {
        let mut state = self.inner.lock();
        state.capacity = capacity;
        state.evict_to_capacity();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().nodes.is_empty()
    }

    pub fn total_size(&self) -> usize {
        self.inner.lock().size
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().nodes.contains(key)
    }

    /// Returns a copy of the record and marks it most recently used.
    pub fn get(&self, key: &str) -> Option<CacheRecord> {
        self.inner.lock().nodes.get(key).cloned()
    }

    pub fn put(&self, key: impl Into<String>, record: CacheRecord) {
        self.inner.lock().put(key.into(), record);
    }

    /// Entries from least to most recently used.
    pub fn entries_oldest_first(&self) -> Vec<(String, CacheRecord)> {
        let state = self.inner.lock();
        state
            .nodes
            .iter()
            .rev()
            .map(|(key, record)| (key.clone(), record.clone()))
            .collect()
    }

    /// Entries from most to least recently used.
    pub fn entries(&self) -> Vec<(String, CacheRecord)> {
        let state = self.inner.lock();
        state
            .nodes
            .iter()
            .map(|(key, record)| (key.clone(), record.clone()))
            .collect()
    }

    /// Replays every entry of `other` into this cache, oldest first, so that
    /// `other`'s values and relative order win.
    pub fn merge_from(&self, other: &LruCache) {
        if std::ptr::eq(self, other) {
            return;
        }
        self.merge_entries(other.entries_oldest_first());
    }

    /// Same as [`merge_from`](Self::merge_from) for entries already copied out.
    pub fn merge_entries(&self, entries: Vec<(String, CacheRecord)>) {
        let mut state = self.inner.lock();
        for (key, record) in entries {
            state.put(key, record);
        }
    }

    /// Drops every entry whose current value is still identical to the one in
    /// `flushed`. Entries rewritten since the copy was taken are kept.
    pub fn retain_changed(&self, flushed: &[(String, CacheRecord)]) {
        let mut state = self.inner.lock();
        for (key, record) in flushed {
            if state.nodes.peek(key.as_str()) == Some(record)
                && let Some(removed) = state.nodes.pop(key.as_str())
            {
                state.size = state.size.saturating_sub(removed.size());
            }
        }
    }

    pub fn write_snapshot(&self) -> DiskSnapshot {
        let state = self.inner.lock();
        let entries = state
            .nodes
            .iter()
            .enumerate()
            .map(|(index, (key, record))| SnapshotEntry {
                key: key.clone(),
                index,
                record: record.clone(),
            })
            .collect();
        DiskSnapshot::new(entries)
    }

    /// Loads a snapshot so that the final recency order matches the order it
    /// was written in.
    pub fn read_snapshot(&self, snapshot: DiskSnapshot) {
        let mut entries = snapshot.into_entries();
        entries.sort_by(|a, b| b.index.cmp(&a.index));

        let mut state = self.inner.lock();
        for entry in entries {
            state.put(entry.key, entry.record);
        }
    }

    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.nodes.clear();
        state.size = 0;
    }
}
