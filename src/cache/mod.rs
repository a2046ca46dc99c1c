//! Response cache: a size-bounded LRU in memory, merged periodically into a
//! single JSON file on disk.

mod disk;
mod key;
mod lru;
mod proxy;
mod record;
mod service;
mod snapshot;
mod store;
mod strategy;

use std::time::Duration;

pub use disk::{DiskLruCache, clamp_capacity};
pub use key::{CacheKey, KeyParts};
pub use lru::LruCache;
pub use proxy::{CacheLookup, CacheProxy};
pub use record::CacheRecord;
pub use service::CacheService;
pub use snapshot::{DiskSnapshot, SnapshotEntry, SnapshotError};
pub use strategy::{CacheStatus, CacheStrategy, HeaderCacheStrategy};

pub const MIN_DISK_CACHE_SIZE: usize = 1024 * 1024;
pub const MAX_DISK_CACHE_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(60);
