use std::path::PathBuf;

use anyhow::Result;
use tempfile::TempDir;

pub struct TestDirs {
    _temp: TempDir,
    pub root: PathBuf,
    pub cache_file: PathBuf,
    pub config_path: PathBuf,
}

impl TestDirs {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let root = temp.path().to_path_buf();
        let cache_file = root.join("cache").join("http_cache.json");
        let config_path = root.join("respcache.toml");

        Ok(Self {
            _temp: temp,
            root,
            cache_file,
            config_path,
        })
    }

    /// Writes a config file pointing at `cache_file` (relative to the config).
    pub fn write_config(&self, extra: &str) -> Result<()> {
        let contents = format!("cache_file = \"cache/http_cache.json\"\nlog = \"text\"\n{extra}");
        std::fs::write(&self.config_path, contents)?;
        Ok(())
    }
}
