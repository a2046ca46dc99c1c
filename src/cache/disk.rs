use std::path::{Path, PathBuf};

use anyhow::Result;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::snapshot::DiskSnapshot;
use super::store::DiskFile;
use super::{CacheRecord, LruCache, MAX_DISK_CACHE_SIZE, MIN_DISK_CACHE_SIZE};

/// Two-tier cache: a size-bounded memory tier in front of one JSON file.
///
/// The memory tier only holds entries written or promoted since the last
/// successful flush; the file holds everything else.
#[derive(Debug)]
pub struct DiskLruCache {
    memory: LruCache,
    file: DiskFile,
    flush_lock: Mutex<()>,
}

pub fn clamp_capacity(capacity: usize) -> usize {
    capacity.clamp(MIN_DISK_CACHE_SIZE, MAX_DISK_CACHE_SIZE)
}

impl DiskLruCache {
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            memory: LruCache::new(clamp_capacity(capacity)),
            file: DiskFile::new(path.into()),
            flush_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn capacity(&self) -> usize {
        self.memory.capacity()
    }

    /// The memory tier, mostly useful for inspection.
    pub fn memory(&self) -> &LruCache {
        &self.memory
    }

    pub fn get(&self, key: &str) -> Option<CacheRecord> {
        if let Some(record) = self.memory.get(key) {
            trace!(key, "cache hit (memory)");
            return Some(record);
        }

        let record = self.load_persisted().get(key)?;
        trace!(key, "cache hit (disk)");
        self.memory.put(key, record.clone());
        crate::metrics::record_disk_promotion();
        Some(record)
    }

    pub fn put(&self, key: &str, record: CacheRecord) {
        self.memory.put(key, record);
    }

    /// Merges the memory tier into the cache file.
    ///
    /// On success the flushed entries leave the memory tier unless they were
    /// rewritten while the file was being written. On failure memory is left
    /// untouched so nothing is lost.
    pub fn write_to_file(&self) -> Result<()> {
        let _flush = self.flush_lock.lock();

        let flushed = self.memory.entries_oldest_first();
        let merged = self.load_persisted();
        merged.merge_entries(flushed.clone());

        let written = merged
            .write_snapshot()
            .to_json()
            .map_err(anyhow::Error::from)
            .and_then(|json| self.file.write(&json));
        crate::metrics::record_flush(written.is_ok());
        written?;

        self.memory.retain_changed(&flushed);
        debug!(
            path = %self.path().display(),
            entries = merged.len(),
            bytes = merged.total_size(),
            flushed = flushed.len(),
            "cache file flushed"
        );
        Ok(())
    }

    pub fn read_from_file(&self) {
        self.load_into(&self.memory);
    }

    /// Clamps and applies a new capacity, then rewrites the file so it fits.
    pub fn set_capacity(&self, capacity: usize) {
        let capacity = clamp_capacity(capacity);
        self.memory.set_capacity(capacity);
        if let Err(err) = self.write_to_file() {
            warn!(error = %err, capacity, "failed to rewrite cache file after resize");
        }
    }

    pub fn delete(&self) -> Result<()> {
        self.memory.clear();
        self.file.remove()
    }

    /// Scratch cache holding what is currently on disk.
    pub fn load_persisted(&self) -> LruCache {
        let scratch = LruCache::new(self.capacity());
        self.load_into(&scratch);
        scratch
    }

    fn load_into(&self, target: &LruCache) {
        let Some(text) = self.file.read() else {
            return;
        };
        match DiskSnapshot::parse(&text) {
            Ok(snapshot) => target.read_snapshot(snapshot),
            Err(err) => warn!(
                error = %err,
                path = %self.path().display(),
                "ignoring corrupt cache file"
            ),
        }
    }
}
