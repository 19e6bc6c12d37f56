//! Live CI server source (Jenkins JSON API).
//!
//! Fetches `{base}/job/{folder}/api/json?tree=...` with a nested `tree`
//! selector so a single request returns every level of the folder hierarchy
//! up to the configured depth.

use std::time::Duration;

use reqwest::Url;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};

use super::{JobSource, SourceError, parse_payload};
use crate::models::FetchPayload;

/// Folder levels requested when not configured.
pub const DEFAULT_TREE_DEPTH: u8 = 3;

/// Request timeout when not configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("cimon/", env!("CARGO_PKG_VERSION"));

/// Fields requested for each job at every level.
const JOB_FIELDS: &str = "name,url,color,lastBuild[number,timestamp,result,duration]";

/// Connection settings for a CI server.
#[derive(Clone)]
pub struct JenkinsConfig {
    pub base_url: String,
    pub username: String,
    pub api_token: String,
    /// Slash-separated folder to list instead of the server root
    pub folder: Option<String>,
    pub tree_depth: u8,
    pub timeout: Duration,
}

impl std::fmt::Debug for JenkinsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JenkinsConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("api_token", &"<redacted>")
            .field("folder", &self.folder)
            .field("tree_depth", &self.tree_depth)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl JenkinsConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            api_token: api_token.into(),
            folder: None,
            tree_depth: DEFAULT_TREE_DEPTH,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// HTTP client for the CI server's JSON API.
#[derive(Debug)]
pub struct JenkinsSource {
    client: reqwest::Client,
    api_url: String,
    username: String,
    api_token: String,
}

impl JenkinsSource {
    /// Build a source. Fails with `CredentialsMissing` when any credential is blank.
    pub fn new(config: JenkinsConfig) -> Result<Self, SourceError> {
        let base_url = config.base_url.trim();
        let username = config.username.trim();
        let api_token = config.api_token.trim();
        if base_url.is_empty() || username.is_empty() || api_token.is_empty() {
            return Err(SourceError::CredentialsMissing);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;

        Ok(Self {
            client,
            api_url: build_api_url(base_url, config.folder.as_deref(), config.tree_depth)?,
            username: username.to_string(),
            api_token: api_token.to_string(),
        })
    }

    /// Full request URL, including the tree selector.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl JobSource for JenkinsSource {
    async fn fetch(&self) -> Result<FetchPayload, SourceError> {
        tracing::debug!(url = %self.api_url, "fetching job tree");

        let response = self
            .client
            .get(&self.api_url)
            .basic_auth(&self.username, Some(&self.api_token))
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("application/json") {
            return Err(SourceError::NotJson { content_type });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;
        tracing::debug!(bytes = body.len(), "received job tree");

        parse_payload(&body)
    }

    fn describe(&self) -> String {
        // Strip the tree selector; it is long and not useful in a status line
        let base = self.api_url.split('?').next().unwrap_or(&self.api_url);
        format!("jenkins {}", base)
    }
}

/// Build the JSON API URL for `folder` (slash-separated, may be nested).
///
/// Folder segments are percent-encoded, so names containing `#`, `?` or
/// spaces address the right folder.
pub fn build_api_url(
    base_url: &str,
    folder: Option<&str>,
    tree_depth: u8,
) -> Result<String, SourceError> {
    let invalid = |message: String| SourceError::InvalidUrl {
        url: base_url.to_string(),
        message,
    };
    let mut url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| invalid("URL cannot be a base".to_string()))?;
        segments.pop_if_empty();
        for segment in folder
            .unwrap_or_default()
            .split('/')
            .filter(|s| !s.is_empty())
        {
            segments.push("job").push(segment);
        }
        segments.extend(["api", "json"]);
    }
    url.set_query(Some(&format!("tree={}", tree_selector(tree_depth))));
    Ok(url.into())
}

/// Nested `tree` selector covering `depth` levels of folders (minimum 1).
pub fn tree_selector(depth: u8) -> String {
    fn level(depth: u8) -> String {
        if depth <= 1 {
            JOB_FIELDS.to_string()
        } else {
            format!("{},jobs[{}]", JOB_FIELDS, level(depth - 1))
        }
    }
    format!("jobs[{}]", level(depth))
}
