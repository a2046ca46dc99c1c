use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Parser)]
#[command(name = "respcache", about = "Inspect and maintain an HTTP response cache file")]
pub struct Cli {
    /// Path to the configuration file (defaults to ./respcache.toml if present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Entry count, bytes used and capacity of the cache file.
    Stats,
    /// Cached requests, most recently used first.
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Rewrite the cache file so it fits the given (or configured) capacity.
    Trim {
        #[arg(long)]
        capacity: Option<usize>,
    },
    /// Remove the cache file.
    Delete,
    /// Print cache counters in Prometheus text format.
    Metrics,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["respcache", "--config", "/tmp/r.toml", "list", "--limit", "5"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/r.toml")));
        assert!(matches!(cli.command, Command::List { limit: Some(5) }));

        let cli = Cli::try_parse_from(["respcache", "trim"]).unwrap();
        assert!(matches!(cli.command, Command::Trim { capacity: None }));
    }

    #[test]
    fn command_is_required() {
        assert!(Cli::try_parse_from(["respcache"]).is_err());
    }
}
