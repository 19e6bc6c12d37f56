//! CLI argument definitions for cimon.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::SortKey;

/// Version line with the commit and build time injected by `build.rs`.
const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CIMON_GIT_COMMIT"),
    ", built ",
    env!("CIMON_BUILD_TIMESTAMP"),
    ")"
);

/// cimon - A terminal dashboard for CI job trees.
///
/// Run without a command to open the dashboard, or use `cimon jobs` for a
/// one-shot listing.
#[derive(Parser, Debug)]
#[command(name = "cimon")]
#[command(author, version, long_version = LONG_VERSION, about = "A terminal dashboard for CI job trees", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Path to config.kdl (default: ~/.config/cimon/config.kdl)
    #[arg(long = "config", global = true, env = "CIMON_CONFIG")]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the job tree once and print it
    ///
    /// Search, folder toggles and sort are applied in that order, the same
    /// way the dashboard applies them.
    Jobs {
        /// Only show jobs whose name contains this text (case-insensitive)
        #[arg(short, long)]
        query: Option<String>,

        /// Sort key: name, status, timestamp, result, duration
        #[arg(short, long, value_parser = parse_sort_key)]
        sort: Option<SortKey>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,

        /// Toggle a folder by slash-separated path (repeatable)
        #[arg(short, long = "toggle", value_name = "PATH")]
        toggle: Vec<String>,

        /// Show the baseline dataset instead of fetching
        #[arg(long)]
        test_mode: bool,

        /// Read the payload from a JSON file instead of the CI server
        #[arg(long, value_name = "FILE", conflicts_with = "test_mode")]
        from_file: Option<PathBuf>,

        /// Fail on the first malformed record instead of skipping it
        #[arg(long)]
        strict: bool,

        /// Start with every folder collapsed
        #[arg(long)]
        collapsed: bool,

        /// Print every node, ignoring folder expansion
        #[arg(long)]
        flat: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Open the interactive dashboard (requires 'tui' feature)
    #[cfg(feature = "tui")]
    Tui {
        /// Seconds between automatic refreshes (default: 30)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Start on the baseline dataset
        #[arg(long)]
        test_mode: bool,

        /// Fail a refresh on the first malformed record instead of skipping it
        #[arg(long)]
        strict: bool,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved settings and where each one came from
    Show,

    /// Print the config file location
    Path,
}

fn parse_sort_key(s: &str) -> Result<SortKey, String> {
    SortKey::parse(s).ok_or_else(|| {
        format!(
            "unknown sort key '{}' (expected one of: name, status, timestamp, result, duration)",
            s
        )
    })
}
