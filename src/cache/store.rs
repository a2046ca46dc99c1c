use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::{trace, warn};

/// The JSON cache file. Reads and writes are serialized by a lock that is
/// independent of any in-memory cache lock.
#[derive(Debug)]
pub(super) struct DiskFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DiskFile {
    pub(super) fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Contents of the cache file, or `None` when it is missing or unreadable.
    pub(super) fn read(&self) -> Option<String> {
        let _guard = self.lock.lock();
        match fs::read_to_string(&self.path) {
            Ok(text) => Some(text),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                warn!(
                    error = %err,
                    path = %self.path.display(),
                    "failed to read cache file"
                );
                None
            }
        }
    }

    /// Replaces the cache file atomically via a sibling temp file.
    pub(super) fn write(&self, contents: &str) -> Result<()> {
        let _guard = self.lock.lock();
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create cache dir {}", parent.display()))?;
        }

        let temp = self.temp_path();
        let written = write_private(&temp, contents.as_bytes())
            .and_then(|()| {
                fs::rename(&temp, &self.path).with_context(|| {
                    format!("failed to move cache file into {}", self.path.display())
                })
            });
        if written.is_err() {
            fs::remove_file(&temp).ok();
        }
        written?;
        trace!(path = %self.path.display(), bytes = contents.len(), "cache file written");
        Ok(())
    }

    pub(super) fn remove(&self) -> Result<()> {
        let _guard = self.lock.lock();
        fs::remove_file(self.temp_path()).ok();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to remove cache file {}", self.path.display())),
        }
    }
}

fn write_private(path: &Path, data: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.create(true).truncate(true).write(true);
    #[cfg(unix)]
    {
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("failed to write cache file {}", path.display()))?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}
