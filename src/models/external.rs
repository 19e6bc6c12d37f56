//! Loosely-typed records as delivered by a job source.
//!
//! Every field is optional here; the normalizer decides what is mandatory.

use serde::{Deserialize, Serialize};

/// Build information attached to an external record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalBuild {
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub duration: Option<u64>,
}

/// A job or folder as reported by the CI server.
///
/// Nesting may arrive as `jobs` (CI server API) or `children`; the state code
/// may arrive as `color` or `status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalJobRecord {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default, alias = "status")]
    pub color: Option<String>,

    #[serde(default)]
    pub last_build: Option<ExternalBuild>,

    #[serde(default, alias = "children")]
    pub jobs: Option<Vec<ExternalJobRecord>>,
}

impl ExternalJobRecord {
    /// Create a record with identity fields set.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_build(mut self, build: ExternalBuild) -> Self {
        self.last_build = Some(build);
        self
    }

    pub fn with_jobs(mut self, jobs: Vec<ExternalJobRecord>) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Nested records, if this record carries a non-empty nested list.
    pub fn nested(&self) -> Option<&[ExternalJobRecord]> {
        self.jobs.as_deref().filter(|jobs| !jobs.is_empty())
    }
}

/// Payload returned by a job source.
///
/// `jobs` is optional so that a payload lacking it can be detected and
/// reported rather than failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchPayload {
    #[serde(default)]
    pub jobs: Option<Vec<ExternalJobRecord>>,

    /// True when the source itself served sample data
    #[serde(default)]
    pub test_mode: bool,

    /// Advisory message from the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchPayload {
    /// A live payload carrying the given records.
    pub fn live(jobs: Vec<ExternalJobRecord>) -> Self {
        Self {
            jobs: Some(jobs),
            test_mode: false,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accepts_ci_server_shape() {
        let json = r#"{
            "_class": "com.cloudbees.hudson.plugins.folder.Folder",
            "name": "backend",
            "url": "https://ci/job/backend/",
            "color": "blue",
            "jobs": [
                {"name": "api", "url": "https://ci/job/backend/job/api/", "color": "blue_anime",
                 "lastBuild": {"number": 8, "timestamp": 1000, "result": null, "duration": 0}}
            ]
        }"#;
        let record: ExternalJobRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name.as_deref(), Some("backend"));
        let nested = record.nested().unwrap();
        assert_eq!(nested.len(), 1);
        let build = nested[0].last_build.as_ref().unwrap();
        assert_eq!(build.number, Some(8));
        assert_eq!(build.result, None);
    }

    #[test]
    fn test_record_accepts_children_and_status_aliases() {
        let json = r#"{"name": "f", "url": "u", "status": "red", "children": [{"name": "a", "url": "v"}]}"#;
        let record: ExternalJobRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.color.as_deref(), Some("red"));
        assert_eq!(record.nested().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_jobs_is_not_nested() {
        let record = ExternalJobRecord::new("a", "u").with_jobs(vec![]);
        assert!(record.nested().is_none());
    }

    #[test]
    fn test_payload_without_jobs() {
        let payload: FetchPayload = serde_json::from_str(r#"{"testMode": true}"#).unwrap();
        assert!(payload.jobs.is_none());
        assert!(payload.test_mode);
    }
}
