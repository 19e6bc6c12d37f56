//! Job sources: where raw job listings come from.
//!
//! - [`JenkinsSource`] - the live CI server over HTTP
//! - [`FileSource`] - a payload saved to disk
//! - [`baseline`] - the embedded dataset shown when nothing else is available
//!
//! Every source yields a [`FetchPayload`]; deciding what to do with a failed
//! fetch is the refresh orchestrator's job.

pub mod baseline;
mod file;
mod jenkins;

pub use file::FileSource;
pub use jenkins::{DEFAULT_TREE_DEPTH, JenkinsConfig, JenkinsSource, build_api_url, tree_selector};

use std::fmt;
use std::future::Future;

use crate::models::FetchPayload;

/// Errors at the fetch boundary.
///
/// None of these are fatal: the orchestrator degrades every one of them to
/// the baseline dataset plus an advisory message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// URL, username or API token not configured
    #[error("CI server credentials are not configured")]
    CredentialsMissing,

    /// Base URL cannot be parsed or cannot carry a path
    #[error("invalid CI server URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    /// Network or client failure
    #[error("request failed: {0}")]
    Http(String),

    /// Non-2xx response
    #[error("CI server responded {code} {reason}")]
    Status { code: u16, reason: String },

    /// Response body is not JSON
    #[error("CI server did not return JSON (content-type: {content_type:?})")]
    NotJson { content_type: String },

    /// Payload parsed but has no jobs array
    #[error("response has no jobs array")]
    MissingJobs,

    /// Payload is not valid JSON of the expected shape
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Local file could not be read
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
}

/// Something that can produce a raw job listing.
pub trait JobSource: Send + Sync + 'static {
    /// Fetch one payload.
    fn fetch(&self) -> impl Future<Output = Result<FetchPayload, SourceError>> + Send;

    /// Human-readable description for logs and status lines.
    fn describe(&self) -> String;
}

/// Which dataset the dashboard shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Fetch from the configured source
    #[default]
    Live,
    /// Show the embedded baseline dataset ("test mode")
    Baseline,
}

impl SourceMode {
    pub fn from_test_mode(test_mode: bool) -> Self {
        if test_mode {
            SourceMode::Baseline
        } else {
            SourceMode::Live
        }
    }

    pub fn is_test_mode(&self) -> bool {
        matches!(self, SourceMode::Baseline)
    }

    pub fn toggled(&self) -> Self {
        match self {
            SourceMode::Live => SourceMode::Baseline,
            SourceMode::Baseline => SourceMode::Live,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceMode::Live => "live",
            SourceMode::Baseline => "baseline",
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a payload body.
///
/// Accepts both a bare CI server response (`{"jobs": [...]}`) and a payload
/// that already carries `testMode` / `error`.
pub fn parse_payload(body: &str) -> Result<FetchPayload, SourceError> {
    serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))
}

/// The source chosen from configuration.
#[derive(Debug)]
pub enum ConfiguredSource {
    Jenkins(JenkinsSource),
    File(FileSource),
    /// Nothing usable configured; every fetch reports missing credentials
    Unconfigured,
}

impl JobSource for ConfiguredSource {
    async fn fetch(&self) -> Result<FetchPayload, SourceError> {
        match self {
            ConfiguredSource::Jenkins(source) => source.fetch().await,
            ConfiguredSource::File(source) => source.fetch().await,
            ConfiguredSource::Unconfigured => Err(SourceError::CredentialsMissing),
        }
    }

    fn describe(&self) -> String {
        match self {
            ConfiguredSource::Jenkins(source) => source.describe(),
            ConfiguredSource::File(source) => source.describe(),
            ConfiguredSource::Unconfigured => "unconfigured".to_string(),
        }
    }
}
