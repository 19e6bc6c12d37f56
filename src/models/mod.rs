//! Data models for cimon.
//!
//! This module defines the canonical job tree:
//! - `JobNode` - A job or folder with its subtree
//! - `BuildRecord` - The most recent build of a job
//! - `JobStatus` - Build state mapped from the CI server's color codes
//! - `SortKey` / `SortDirection` - Ordering requested by the dashboard
//!
//! The loosely-typed shapes received from a job source live in [`external`].

pub mod external;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub use external::{ExternalBuild, ExternalJobRecord, FetchPayload};

/// A sequence of sibling nodes, in display order.
///
/// Nodes are shared behind `Arc` so that tree transformations can hand back
/// untouched subtrees without copying them.
pub type JobList = Vec<Arc<JobNode>>;

/// Build state of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Success,
    Failure,
    InProgress,
    Disabled,
    Unstable,
    #[default]
    Unknown,
}

impl JobStatus {
    /// Map a CI color code (e.g. `blue`, `red_anime`) to a status.
    ///
    /// Canonical status names are accepted as well, so payloads that were
    /// already normalized round-trip unchanged.
    pub fn from_code(code: &str) -> Self {
        match code {
            "blue" | "success" => JobStatus::Success,
            "red" | "failure" => JobStatus::Failure,
            "disabled" => JobStatus::Disabled,
            "yellow" | "unstable" => JobStatus::Unstable,
            "in_progress" => JobStatus::InProgress,
            c if c.contains("anime") => JobStatus::InProgress,
            _ => JobStatus::Unknown,
        }
    }

    /// Canonical lowercase name, also used as the sort value for `SortKey::Status`.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Success => "success",
            JobStatus::Failure => "failure",
            JobStatus::InProgress => "in_progress",
            JobStatus::Disabled => "disabled",
            JobStatus::Unstable => "unstable",
            JobStatus::Unknown => "unknown",
        }
    }

    /// Short label for human output.
    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Success => "Success",
            JobStatus::Failure => "Failure",
            JobStatus::InProgress => "In progress",
            JobStatus::Disabled => "Disabled",
            JobStatus::Unstable => "Unstable",
            JobStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The most recent build attempt of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Per-job build counter, starting at 1
    pub number: u64,
    /// Build start time, epoch milliseconds
    pub timestamp: i64,
    /// Terminal outcome; `None` while the build is running
    pub result: Option<String>,
    /// Milliseconds, zero while in progress
    pub duration: u64,
}

impl BuildRecord {
    /// Whether the build has not reached a terminal result yet.
    pub fn is_running(&self) -> bool {
        self.result.is_none()
    }

    /// Result for display; running builds show as `IN PROGRESS`.
    pub fn display_result(&self) -> &str {
        self.result.as_deref().unwrap_or("IN PROGRESS")
    }

    /// Format the duration as `"{m}m {s}s"`, or `-` when unknown.
    pub fn display_duration(&self) -> String {
        format_duration(self.duration)
    }

    /// Format the timestamp in local time, or `-` when unknown.
    pub fn display_timestamp(&self) -> String {
        format_timestamp(self.timestamp)
    }
}

/// Format a millisecond duration as minutes and seconds.
pub fn format_duration(duration_ms: u64) -> String {
    if duration_ms == 0 {
        return "-".to_string();
    }
    let seconds = duration_ms / 1000;
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Format an epoch-millisecond timestamp in the local timezone.
pub fn format_timestamp(timestamp_ms: i64) -> String {
    if timestamp_ms == 0 {
        return "-".to_string();
    }
    match chrono::DateTime::from_timestamp_millis(timestamp_ms) {
        Some(utc) => utc
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "-".to_string(),
    }
}

/// A job or folder in the canonical tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobNode {
    /// Identifier, unique among siblings only by convention
    pub name: String,

    /// Canonical locator of the job or folder
    pub url: String,

    /// Build state
    #[serde(default)]
    pub status: JobStatus,

    /// True iff this node groups child nodes
    #[serde(default)]
    pub is_folder: bool,

    /// Ancestor names from the root down to the parent
    #[serde(default)]
    pub path: Vec<String>,

    /// UI-only expansion flag, meaningful for folders
    #[serde(default)]
    pub expanded: bool,

    /// Children in display order; always empty for jobs
    #[serde(default)]
    pub children: JobList,

    /// Most recent build, absent when the source reported none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_build: Option<BuildRecord>,
}

impl JobNode {
    /// Create a leaf job at the given path.
    pub fn job(name: impl Into<String>, url: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            status: JobStatus::Unknown,
            is_folder: false,
            path,
            expanded: false,
            children: Vec::new(),
            last_build: None,
        }
    }

    /// Create a folder at the given path.
    pub fn folder(
        name: impl Into<String>,
        url: impl Into<String>,
        path: Vec<String>,
        children: JobList,
        expanded: bool,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            status: JobStatus::Unknown,
            is_folder: true,
            path,
            expanded,
            children,
            last_build: None,
        }
    }

    /// Builder-style status setter.
    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder-style build setter.
    pub fn with_build(mut self, build: BuildRecord) -> Self {
        self.last_build = Some(build);
        self
    }

    /// Ancestor chain plus own name: the path used to address this node.
    pub fn full_path(&self) -> Vec<String> {
        let mut full = self.path.clone();
        full.push(self.name.clone());
        full
    }

    /// Depth in the tree (root-level nodes are at depth 0).
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Count of this node and all its descendants.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| child.subtree_len())
            .sum::<usize>()
    }
}

/// Total number of nodes in a tree.
pub fn tree_len(tree: &[Arc<JobNode>]) -> usize {
    tree.iter().map(|node| node.subtree_len()).sum()
}

/// Column the dashboard orders jobs by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    Status,
    LastBuildTimestamp,
    LastBuildResult,
    LastBuildDuration,
}

impl SortKey {
    /// All keys, in column order.
    pub const ALL: [SortKey; 5] = [
        SortKey::Name,
        SortKey::Status,
        SortKey::LastBuildTimestamp,
        SortKey::LastBuildResult,
        SortKey::LastBuildDuration,
    ];

    /// Parse from string, case-insensitive. Accepts short aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "name" => Some(SortKey::Name),
            "status" => Some(SortKey::Status),
            "last_build_timestamp" | "timestamp" | "time" => Some(SortKey::LastBuildTimestamp),
            "last_build_result" | "result" => Some(SortKey::LastBuildResult),
            "last_build_duration" | "duration" => Some(SortKey::LastBuildDuration),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Status => "status",
            SortKey::LastBuildTimestamp => "last_build_timestamp",
            SortKey::LastBuildResult => "last_build_result",
            SortKey::LastBuildDuration => "last_build_duration",
        }
    }

    /// The key after this one, wrapping around.
    pub fn next(&self) -> Self {
        let idx = SortKey::ALL.iter().position(|k| k == self).unwrap_or(0);
        SortKey::ALL[(idx + 1) % SortKey::ALL.len()]
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(&self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Arrow shown next to the active column header.
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortConfig {
    /// Next sort config when the user requests `key`.
    ///
    /// Requesting the active key while ascending flips to descending;
    /// any other request starts ascending.
    pub fn request(current: Option<SortConfig>, key: SortKey) -> SortConfig {
        let direction = match current {
            Some(c) if c.key == key && c.direction == SortDirection::Ascending => {
                SortDirection::Descending
            }
            _ => SortDirection::Ascending,
        };
        SortConfig { key, direction }
    }
}
