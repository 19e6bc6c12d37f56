//! Smoke tests for the cimon CLI.
//!
//! These tests verify basic CLI functionality:
//! - `cimon --version` outputs version info
//! - `cimon --help` lists the commands
//! - unknown arguments fail cleanly

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_version_flag() {
    TestEnv::new()
        .cimon()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cimon"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    TestEnv::new()
        .cimon()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("jobs"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_jobs_help_lists_view_options() {
    TestEnv::new()
        .cimon()
        .args(["jobs", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--query"))
        .stdout(predicate::str::contains("--sort"))
        .stdout(predicate::str::contains("--toggle"))
        .stdout(predicate::str::contains("--from-file"));
}

#[test]
fn test_unknown_command_fails() {
    TestEnv::new()
        .cimon()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
