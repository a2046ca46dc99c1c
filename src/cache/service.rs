use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{
    CacheLookup, CacheProxy, CacheStrategy, DEFAULT_FLUSH_INTERVAL, DiskLruCache,
    HeaderCacheStrategy, MAX_DISK_CACHE_SIZE,
};
use crate::http::{RequestContext, RequestOptions, Transport, now_http_date};
use crate::logging::CacheAccessBuilder;
use crate::settings::Settings;

/// Owns the disk cache, the cache policy and the background flush thread.
///
/// Nothing is served or stored until [`run`](Self::run) is called. Share it
/// between request handlers as `Arc<CacheService>`.
pub struct CacheService {
    disk: Arc<DiskLruCache>,
    strategy: Arc<dyn CacheStrategy>,
    flush_interval: Duration,
    running: AtomicBool,
    worker: Mutex<Option<FlushWorker>>,
}

struct FlushWorker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl FlushWorker {
    fn stop(self) {
        // A worker that already exited has dropped its receiver.
        self.stop.send(()).ok();
        if self.handle.join().is_err() {
            warn!("cache flush thread panicked");
        }
    }
}

impl CacheService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            disk: Arc::new(DiskLruCache::new(path, MAX_DISK_CACHE_SIZE)),
            strategy: Arc::new(HeaderCacheStrategy::new()),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            running: AtomicBool::new(false),
            worker: Mutex::new(None),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.cache_file.clone()).with_flush_interval(settings.flush_interval())
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn CacheStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    pub fn disk(&self) -> &DiskLruCache {
        &self.disk
    }

    pub fn strategy(&self) -> &dyn CacheStrategy {
        self.strategy.as_ref()
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn run(&self) -> Result<()> {
        self.run_with_capacity(MAX_DISK_CACHE_SIZE)
    }

    /// Starts the cache with `capacity` (clamped). Calling it again while
    /// running does nothing.
    pub fn run_with_capacity(&self, capacity: usize) -> Result<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Ok(());
        }

        self.disk.set_capacity(capacity);
        self.disk.read_from_file();

        let (stop, stopped) = mpsc::channel();
        let disk = Arc::clone(&self.disk);
        let interval = self.flush_interval;
        let handle = thread::Builder::new()
            .name("respcache-flush".into())
            .spawn(move || flush_loop(&disk, &stopped, interval))
            .context("failed to spawn cache flush thread")?;

        *worker = Some(FlushWorker { stop, handle });
        self.running.store(true, Ordering::Release);
        info!(
            path = %self.disk.path().display(),
            capacity = self.disk.capacity(),
            interval_secs = interval.as_secs(),
            "response cache started"
        );
        Ok(())
    }

    /// Writes the memory tier to disk now. Does nothing when not running.
    pub fn flush(&self) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }
        self.disk.write_to_file()
    }

    /// Stops the flush thread and removes the cache file and every in-memory
    /// entry. A later `run` starts from an empty cache.
    pub fn stop_and_delete(&self) -> Result<()> {
        let mut worker = self.worker.lock();
        self.running.store(false, Ordering::Release);
        if let Some(worker) = worker.take() {
            worker.stop();
        }
        self.disk.delete()?;
        info!(path = %self.disk.path().display(), "response cache deleted");
        Ok(())
    }

    /// Stops the flush thread and writes whatever is still in memory.
    pub fn shutdown(&self) -> Result<()> {
        let mut worker = self.worker.lock();
        self.running.store(false, Ordering::Release);
        let Some(running) = worker.take() else {
            return Ok(());
        };
        running.stop();
        self.disk.write_to_file()?;
        info!(path = %self.disk.path().display(), "response cache stopped");
        Ok(())
    }

    pub fn proxy(&self, request: &RequestOptions) -> CacheProxy<'_> {
        CacheProxy::new(self, request)
    }

    /// Serves `context` from the cache when possible, otherwise through
    /// `transport`, storing the result. Only transport errors are returned.
    pub fn execute(&self, context: &mut RequestContext, transport: &dyn Transport) -> Result<()> {
        let started = Instant::now();
        let request_time = now_http_date();
        let proxy = self.proxy(&context.options);
        let mut access = CacheAccessBuilder::new(context.options.method.as_str(), &context.options.url);

        if context.options.using_cache {
            let lookup = proxy.lookup(context);
            access = access.cache_lookup(lookup.as_str());
            if lookup == CacheLookup::Fresh {
                access
                    .status(context.response.response_code)
                    .bytes(context.response.result.len() as u64)
                    .elapsed(started.elapsed())
                    .log();
                return Ok(());
            }
        } else {
            crate::metrics::record_cache_lookup(CacheLookup::Bypass.as_str());
            access = access.cache_lookup(CacheLookup::Bypass.as_str());
        }

        if let Err(err) = transport.execute(context) {
            access.error(err.to_string()).elapsed(started.elapsed()).log();
            return Err(err);
        }

        let response = &mut context.response;
        if response.request_time.is_empty() {
            response.request_time = request_time;
        }
        if response.response_time.is_empty() {
            response.response_time = now_http_date();
        }

        let stored = proxy.write_response_to_cache(response);
        access
            .cache_store(if stored { "stored" } else { "skipped" })
            .status(response.response_code)
            .bytes(response.result.len() as u64)
            .elapsed(started.elapsed())
            .log();
        Ok(())
    }
}

impl Drop for CacheService {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(error = %err, "final cache flush failed");
        }
    }
}

fn flush_loop(disk: &DiskLruCache, stopped: &mpsc::Receiver<()>, interval: Duration) {
    loop {
        match stopped.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => flush_logged(disk),
            Ok(()) => break,
            Err(RecvTimeoutError::Disconnected) => {
                flush_logged(disk);
                break;
            }
        }
    }
    debug!("cache flush thread exiting");
}

fn flush_logged(disk: &DiskLruCache) {
    if let Err(err) = disk.write_to_file() {
        warn!(
            error = %err,
            path = %disk.path().display(),
            "periodic cache flush failed"
        );
    }
}
