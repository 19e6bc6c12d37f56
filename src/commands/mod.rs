//! Command implementations for the cimon CLI.
//!
//! - `jobs` - one refresh cycle, then search/sort/toggle, printed as a tree
//! - `config` - resolved settings and the config file location

mod config;
mod jobs;

pub use config::{ConfigPath, ConfigShow, config_path, config_show};
pub use jobs::{JobsOptions, JobsResult, jobs};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait CommandResult {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}
