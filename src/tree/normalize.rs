//! Tree normalizer: external records into the canonical `JobNode` tree.
//!
//! A record is a folder iff it carries a non-empty nested list. Each node's
//! `path` is established here, from the parent path handed down the recursion.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::models::{BuildRecord, ExternalBuild, ExternalJobRecord, JobList, JobNode, JobStatus};
use crate::{Error, Result};

/// What to do with a record that lacks its identity fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Drop the record and its subtree, keep normalizing the batch
    #[default]
    Skip,
    /// Fail the whole call on the first malformed record
    Abort,
}

/// Why a record was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedReason {
    MissingName,
    MissingUrl,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::MissingName => write!(f, "missing name"),
            MalformedReason::MissingUrl => write!(f, "missing url"),
        }
    }
}

/// A record dropped under [`MalformedPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// Path of the parent the record was found under
    pub path: Vec<String>,
    /// Position among its siblings in the source listing
    pub index: usize,
    pub reason: MalformedReason,
}

impl SkippedRecord {
    /// `parent/path[index]`, or `[index]` at the top level.
    pub fn location(&self) -> String {
        display_location(&self.path, self.index)
    }
}

/// Options controlling normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Initial `expanded` flag for folders
    pub expand_folders: bool,
    pub policy: MalformedPolicy,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            expand_folders: true,
            policy: MalformedPolicy::Skip,
        }
    }
}

impl NormalizeOptions {
    /// Options for the baseline dataset, which is presented collapsed.
    pub fn collapsed() -> Self {
        Self {
            expand_folders: false,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: MalformedPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Normalized tree plus the records that were skipped on the way.
#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    pub jobs: JobList,
    pub skipped: Vec<SkippedRecord>,
}

/// Normalize with default options: folders expanded, malformed records skipped.
pub fn normalize(raw: &[ExternalJobRecord], parent_path: &[String]) -> JobList {
    let mut skipped = Vec::new();
    // Skip policy never returns an error.
    normalize_level(raw, parent_path, &NormalizeOptions::default(), &mut skipped)
        .unwrap_or_default()
}

/// Normalize with explicit options.
///
/// Under [`MalformedPolicy::Abort`] the first malformed record fails the call
/// with [`Error::MalformedRecord`].
pub fn normalize_with(
    raw: &[ExternalJobRecord],
    parent_path: &[String],
    options: &NormalizeOptions,
) -> Result<NormalizeReport> {
    let mut skipped = Vec::new();
    let jobs = normalize_level(raw, parent_path, options, &mut skipped)?;
    Ok(NormalizeReport { jobs, skipped })
}

fn normalize_level(
    raw: &[ExternalJobRecord],
    parent_path: &[String],
    options: &NormalizeOptions,
    skipped: &mut Vec<SkippedRecord>,
) -> Result<JobList> {
    let mut nodes = Vec::with_capacity(raw.len());

    for (index, record) in raw.iter().enumerate() {
        let (name, url) = match identity(record) {
            Ok(identity) => identity,
            Err(reason) => {
                match options.policy {
                    MalformedPolicy::Abort => {
                        return Err(Error::MalformedRecord {
                            path: display_location(parent_path, index),
                            reason: reason.to_string(),
                        });
                    }
                    MalformedPolicy::Skip => {
                        tracing::warn!(
                            location = %display_location(parent_path, index),
                            %reason,
                            "skipping malformed job record"
                        );
                        skipped.push(SkippedRecord {
                            path: parent_path.to_vec(),
                            index,
                            reason,
                        });
                    }
                }
                continue;
            }
        };

        let status = record
            .color
            .as_deref()
            .map(JobStatus::from_code)
            .unwrap_or_default();
        let last_build = record.last_build.as_ref().and_then(build_record);

        let node = match record.nested() {
            Some(nested) => {
                let mut child_path = parent_path.to_vec();
                child_path.push(name.to_string());
                let children = normalize_level(nested, &child_path, options, skipped)?;
                JobNode {
                    name: name.to_string(),
                    url: url.to_string(),
                    status,
                    is_folder: true,
                    path: parent_path.to_vec(),
                    expanded: options.expand_folders,
                    children,
                    last_build,
                }
            }
            None => JobNode {
                name: name.to_string(),
                url: url.to_string(),
                status,
                is_folder: false,
                path: parent_path.to_vec(),
                expanded: false,
                children: Vec::new(),
                last_build,
            },
        };

        nodes.push(Arc::new(node));
    }

    Ok(nodes)
}

fn identity(record: &ExternalJobRecord) -> std::result::Result<(&str, &str), MalformedReason> {
    let name = record
        .name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .ok_or(MalformedReason::MissingName)?;
    let url = record.url.as_deref().ok_or(MalformedReason::MissingUrl)?;
    Ok((name, url))
}

/// Copy build fields verbatim; a build without a number is treated as absent.
fn build_record(build: &ExternalBuild) -> Option<BuildRecord> {
    Some(BuildRecord {
        number: build.number?,
        timestamp: build.timestamp.unwrap_or(0),
        result: build.result.clone(),
        duration: build.duration.unwrap_or(0),
    })
}

fn display_location(parent_path: &[String], index: usize) -> String {
    if parent_path.is_empty() {
        format!("[{}]", index)
    } else {
        format!("{}[{}]", parent_path.join("/"), index)
    }
}
