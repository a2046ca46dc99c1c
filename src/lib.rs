pub mod base64;
pub mod cache;
pub mod cli;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod settings;

use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    cache::{CacheKey, DiskLruCache, clamp_capacity},
    cli::Command,
    settings::Settings,
};

/// Runs one maintenance command against the configured cache file, writing
/// human-readable output to `out`.
pub fn run(settings: &Settings, command: &Command, out: &mut dyn Write) -> Result<()> {
    let disk = DiskLruCache::new(settings.cache_file.clone(), settings.capacity);

    match command {
        Command::Stats => {
            let persisted = disk.load_persisted();
            writeln!(out, "path: {}", disk.path().display())?;
            writeln!(out, "entries: {}", persisted.len())?;
            writeln!(out, "bytes: {}", persisted.total_size())?;
            writeln!(out, "capacity: {}", disk.capacity())?;
        }
        Command::List { limit } => {
            let persisted = disk.load_persisted();
            let limit = limit.unwrap_or(usize::MAX);
            for (key, record) in persisted.entries().into_iter().take(limit) {
                match CacheKey::describe(&key) {
                    Some(parts) => {
                        writeln!(out, "{} {} {}", parts.method, parts.url, record.size())?
                    }
                    None => writeln!(out, "? {key} {}", record.size())?,
                }
            }
        }
        Command::Trim { capacity } => {
            let capacity = clamp_capacity(capacity.unwrap_or(settings.capacity));
            let resized = DiskLruCache::new(settings.cache_file.clone(), capacity);
            resized
                .write_to_file()
                .with_context(|| format!("failed to trim {}", resized.path().display()))?;
            let persisted = resized.load_persisted();
            info!(
                path = %resized.path().display(),
                capacity,
                entries = persisted.len(),
                "cache file trimmed"
            );
            writeln!(
                out,
                "trimmed to {} entries, {} of {capacity} bytes",
                persisted.len(),
                persisted.total_size()
            )?;
        }
        Command::Delete => {
            disk.delete()?;
            writeln!(out, "deleted {}", disk.path().display())?;
        }
        Command::Metrics => {
            // Counters are per process; replaying the file fills eviction and
            // rejection counts for the configured capacity.
            disk.load_persisted();
            out.write_all(metrics::render()?.as_bytes())?;
        }
    }
    Ok(())
}
