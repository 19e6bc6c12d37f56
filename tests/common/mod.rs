//! Common test utilities for cimon integration tests.
//!
//! Provides `TestEnv` for isolated runs that never read the user's
//! `~/.config/cimon/config.kdl` or their CI credentials.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
pub use tempfile::TempDir;

/// Environment variables that would leak the developer's setup into a run.
const SCRUBBED_ENV: &[&str] = &[
    "JENKINS_URL",
    "JENKINS_USERNAME",
    "JENKINS_API_TOKEN",
    "JENKINS_TEST_MODE",
    "CIMON_LOG",
];

/// A small payload with one folder, two jobs and one malformed record.
pub const PAYLOAD: &str = r#"{"jobs": [
    {"name": "backend", "url": "https://ci/job/backend/", "jobs": [
        {"name": "api-service", "url": "https://ci/job/backend/job/api-service/", "color": "blue",
         "lastBuild": {"number": 12, "timestamp": 1700000000000, "result": "SUCCESS", "duration": 95000}},
        {"name": "db-migrate", "url": "https://ci/job/backend/job/db-migrate/", "color": "red",
         "lastBuild": {"number": 4, "timestamp": 1700000500000, "result": "FAILURE", "duration": 30000}}
    ]},
    {"name": "nightly", "url": "https://ci/job/nightly/", "color": "blue_anime",
     "lastBuild": {"number": 88, "timestamp": 1700001000000, "result": null, "duration": 0}},
    {"url": "https://ci/job/anonymous/"}
]}"#;

/// A test environment with its own config directory.
///
/// `cimon()` returns a `Command` pointed at `config.kdl` inside the temp
/// directory (which does not exist until `write_config` is called).
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.kdl")
    }

    pub fn write_config(&self, contents: &str) {
        std::fs::write(self.config_path(), contents).unwrap();
    }

    /// Write a payload fixture and return its path.
    pub fn write_payload(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Get a Command for the cimon binary with an isolated config.
    pub fn cimon(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_cimon"));
        cmd.current_dir(self.dir.path());
        cmd.env("CIMON_CONFIG", self.config_path());
        for name in SCRUBBED_ENV {
            cmd.env_remove(name);
        }
        cmd
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse stdout as JSON.
pub fn parse_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}
