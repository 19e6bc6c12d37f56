//! cimon - A terminal dashboard for CI job trees.
//!
//! This library provides the core functionality for the `cimon` CLI tool:
//! normalizing nested job listings into a canonical tree, searching, sorting
//! and expanding that tree, and keeping it fresh with a polling orchestrator
//! that falls back to a baseline dataset when the CI server is unavailable.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod models;
pub mod refresh;
pub mod source;
pub mod tree;
pub mod tui;

pub use source::SourceError;

/// Library-level error type for cimon operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Malformed job record at {path}: {reason}")]
    MalformedRecord { path: String, reason: String },

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for cimon operations.
pub type Result<T> = std::result::Result<T, Error>;
