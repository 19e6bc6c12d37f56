//! KDL schema for config.kdl.
//!
//! ```kdl
//! jenkins-url "https://ci.example.com"
//! username "ci-bot"
//! folder "projects"
//! refresh-interval 30
//! tree-depth 3
//! request-timeout 15
//! test-mode #false
//! strict #false
//! ```
//!
//! The API token is deliberately not part of the schema; it is read from the
//! environment only. A token found in the file is reported and ignored.

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};

/// Node names a token might be stored under by mistake.
const TOKEN_NODES: &[&str] = &["api-token", "token", "jenkins-api-token"];

/// Largest accepted `tree-depth`.
pub const MAX_TREE_DEPTH: u8 = 10;

/// Settings stored in config.kdl. Every field is optional; unset fields fall
/// through to environment variables and then to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CimonConfig {
    /// CI server base URL
    pub jenkins_url: Option<String>,

    /// API username
    pub username: Option<String>,

    /// Folder to list instead of the server root (slash-separated)
    pub folder: Option<String>,

    /// Seconds between timed refreshes in the dashboard
    pub refresh_interval: Option<u64>,

    /// Folder levels requested per fetch
    pub tree_depth: Option<u8>,

    /// Request timeout in seconds
    pub request_timeout: Option<u64>,

    /// Start on the baseline dataset
    pub test_mode: Option<bool>,

    /// Abort a load on the first malformed record instead of skipping it
    pub strict: Option<bool>,
}

impl CimonConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref url) = self.jenkins_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!(
                    "jenkins-url must start with http:// or https://, got {:?}",
                    url
                ));
            }
        }
        if self.refresh_interval == Some(0) {
            return Err("refresh-interval must be at least 1 second".to_string());
        }
        if let Some(depth) = self.tree_depth {
            if !(1..=MAX_TREE_DEPTH).contains(&depth) {
                return Err(format!(
                    "tree-depth must be 1-{}, got {}",
                    MAX_TREE_DEPTH, depth
                ));
            }
        }
        if self.request_timeout == Some(0) {
            return Err("request-timeout must be at least 1 second".to_string());
        }
        Ok(())
    }

    /// Parse config from a KDL document. Unknown nodes and values of the
    /// wrong type are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        Self {
            jenkins_url: string_value(doc, "jenkins-url"),
            username: string_value(doc, "username"),
            folder: string_value(doc, "folder"),
            refresh_interval: integer_value(doc, "refresh-interval")
                .and_then(|i| u64::try_from(i).ok()),
            tree_depth: integer_value(doc, "tree-depth").and_then(|i| u8::try_from(i).ok()),
            request_timeout: integer_value(doc, "request-timeout")
                .and_then(|i| u64::try_from(i).ok()),
            test_mode: bool_value(doc, "test-mode"),
            strict: bool_value(doc, "strict"),
        }
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref url) = self.jenkins_url {
            push(&mut doc, "jenkins-url", KdlValue::String(url.clone()));
        }
        if let Some(ref username) = self.username {
            push(&mut doc, "username", KdlValue::String(username.clone()));
        }
        if let Some(ref folder) = self.folder {
            push(&mut doc, "folder", KdlValue::String(folder.clone()));
        }
        if let Some(interval) = self.refresh_interval {
            push(&mut doc, "refresh-interval", KdlValue::Integer(interval as i128));
        }
        if let Some(depth) = self.tree_depth {
            push(&mut doc, "tree-depth", KdlValue::Integer(depth as i128));
        }
        if let Some(timeout) = self.request_timeout {
            push(&mut doc, "request-timeout", KdlValue::Integer(timeout as i128));
        }
        if let Some(test_mode) = self.test_mode {
            push(&mut doc, "test-mode", KdlValue::Bool(test_mode));
        }
        if let Some(strict) = self.strict {
            push(&mut doc, "strict", KdlValue::Bool(strict));
        }

        doc
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &CimonConfig) {
        if other.jenkins_url.is_some() {
            self.jenkins_url = other.jenkins_url.clone();
        }
        if other.username.is_some() {
            self.username = other.username.clone();
        }
        if other.folder.is_some() {
            self.folder = other.folder.clone();
        }
        if other.refresh_interval.is_some() {
            self.refresh_interval = other.refresh_interval;
        }
        if other.tree_depth.is_some() {
            self.tree_depth = other.tree_depth;
        }
        if other.request_timeout.is_some() {
            self.request_timeout = other.request_timeout;
        }
        if other.test_mode.is_some() {
            self.test_mode = other.test_mode;
        }
        if other.strict.is_some() {
            self.strict = other.strict;
        }
    }
}

/// Whether the document stores an API token, which is never read from disk.
pub fn has_token_in_config(doc: &KdlDocument) -> bool {
    TOKEN_NODES.iter().any(|name| doc.get(name).is_some())
}

fn first_value<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a KdlValue> {
    doc.get(name)
        .and_then(|node| node.entries().first())
        .map(|entry| entry.value())
}

fn string_value(doc: &KdlDocument, name: &str) -> Option<String> {
    first_value(doc, name)
        .and_then(|v| v.as_string())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn integer_value(doc: &KdlDocument, name: &str) -> Option<i128> {
    first_value(doc, name).and_then(|v| v.as_integer())
}

fn bool_value(doc: &KdlDocument, name: &str) -> Option<bool> {
    first_value(doc, name).and_then(|v| v.as_bool())
}

fn push(doc: &mut KdlDocument, name: &str, value: KdlValue) {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(value));
    doc.nodes_mut().push(node);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> CimonConfig {
        CimonConfig {
            jenkins_url: Some("https://ci.example.com".to_string()),
            username: Some("ci-bot".to_string()),
            folder: Some("projects".to_string()),
            refresh_interval: Some(60),
            tree_depth: Some(4),
            request_timeout: Some(10),
            test_mode: Some(false),
            strict: Some(true),
        }
    }

    #[test]
    fn test_config_default() {
        let config = CimonConfig::default();
        assert_eq!(config.jenkins_url, None);
        assert_eq!(config.refresh_interval, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validate_valid() {
        assert!(full_config().validate().is_ok());
    }

    #[test]
    fn test_config_validate_bad_url() {
        let config = CimonConfig {
            jenkins_url: Some("ci.example.com".to_string()),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("jenkins-url"));
    }

    #[test]
    fn test_config_validate_ranges() {
        let zero_interval = CimonConfig {
            refresh_interval: Some(0),
            ..Default::default()
        };
        assert!(zero_interval.validate().unwrap_err().contains("refresh-interval"));

        let deep = CimonConfig {
            tree_depth: Some(MAX_TREE_DEPTH + 1),
            ..Default::default()
        };
        assert!(deep.validate().unwrap_err().contains("tree-depth must be 1-10"));

        let zero_timeout = CimonConfig {
            request_timeout: Some(0),
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_config_from_kdl_empty() {
        let doc = KdlDocument::new();
        assert_eq!(CimonConfig::from_kdl(&doc), CimonConfig::default());
    }

    #[test]
    fn test_config_from_kdl_full() {
        let kdl = r#"
            jenkins-url "https://ci.example.com"
            username "ci-bot"
            folder "projects"
            refresh-interval 60
            tree-depth 4
            request-timeout 10
            test-mode #false
            strict #true
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        assert_eq!(CimonConfig::from_kdl(&doc), full_config());
    }

    #[test]
    fn test_config_from_kdl_ignores_wrong_types() {
        let kdl = r#"
            refresh-interval "soon"
            tree-depth -1
            username ""
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        let config = CimonConfig::from_kdl(&doc);
        assert_eq!(config.refresh_interval, None);
        assert_eq!(config.tree_depth, None);
        assert_eq!(config.username, None);
    }

    #[test]
    fn test_config_to_kdl_roundtrip() {
        let config = full_config();
        let text = config.to_kdl().to_string();
        let doc: KdlDocument = text.parse().unwrap();
        assert_eq!(CimonConfig::from_kdl(&doc), config);
    }

    #[test]
    fn test_config_merge() {
        let mut base = full_config();
        let other = CimonConfig {
            folder: Some("other".to_string()),
            strict: Some(false),
            ..Default::default()
        };
        base.merge(&other);
        assert_eq!(base.folder.as_deref(), Some("other"));
        assert_eq!(base.strict, Some(false));
        assert_eq!(base.username.as_deref(), Some("ci-bot"));
        assert_eq!(base.refresh_interval, Some(60));
    }

    #[test]
    fn test_token_in_config_detected() {
        let doc: KdlDocument = r#"api-token "abc""#.parse().unwrap();
        assert!(has_token_in_config(&doc));
        let doc: KdlDocument = r#"username "me""#.parse().unwrap();
        assert!(!has_token_in_config(&doc));
    }
}
