use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail, ensure};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::cli::{Cli, LogFormat};

fn default_capacity() -> usize {
    10 * 1024 * 1024 // 10 MiB
}

fn default_flush_interval() -> u64 {
    60
}

fn default_log_format() -> LogFormat {
    LogFormat::Json
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub cache_file: PathBuf,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_flush_interval")]
    pub flush_interval: u64,
    #[serde(default = "default_log_format")]
    pub log: LogFormat,
}

impl Settings {
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = resolve_config_path(cli)?;
        Self::load_from(&config_path)
    }

    /// Loads `config_path` overlaid with `RESPCACHE__*` environment variables.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let cfg = Config::builder()
            .add_source(File::from(config_path.to_path_buf()).required(true))
            .add_source(
                Environment::with_prefix("RESPCACHE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(to_anyhow)?;
        let mut settings: Settings = cfg.try_deserialize().map_err(to_anyhow)?;
        settings.apply_base_dir(config_path);
        settings.validate()?;
        Ok(settings)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval)
    }
}

fn to_anyhow(err: ConfigError) -> anyhow::Error {
    anyhow::anyhow!(err)
}

impl Cli {
    pub fn config_path(&self) -> Option<&Path> {
        self.config.as_deref()
    }
}

fn resolve_config_path(cli: &Cli) -> Result<PathBuf> {
    if let Some(path) = cli.config_path() {
        return Ok(path.to_path_buf());
    }

    for candidate in default_config_candidates() {
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    bail!(
        "no configuration file provided via --config and none found in default locations: {}",
        default_config_candidates()
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
}

fn default_config_candidates() -> [PathBuf; 2] {
    [
        PathBuf::from("/etc/respcache/respcache.toml"),
        PathBuf::from("respcache.toml"),
    ]
}

impl Settings {
    fn apply_base_dir(&mut self, config_path: &Path) {
        let base_dir = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        self.cache_file = absolutize(&self.cache_file, base_dir);
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.capacity > 0,
            "capacity must be greater than 0 (got {})",
            self.capacity
        );
        ensure!(
            self.flush_interval > 0,
            "flush_interval must be greater than 0 seconds (got {})",
            self.flush_interval
        );
        ensure!(
            !self.cache_file.as_os_str().is_empty(),
            "cache_file must not be empty"
        );
        Ok(())
    }
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
