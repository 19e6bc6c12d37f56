//! Precedence resolution for settings.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags
//! 2. Environment variables (`JENKINS_URL`, `JENKINS_USERNAME`,
//!    `JENKINS_API_TOKEN`, `JENKINS_TEST_MODE`)
//! 3. config.kdl
//! 4. Built-in defaults
//!
//! The API token only ever comes from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::Result;
use crate::config::CimonConfig;
use crate::refresh::DEFAULT_REFRESH_INTERVAL;
use crate::source::{
    ConfiguredSource, DEFAULT_TREE_DEPTH, JenkinsConfig, JenkinsSource, SourceError, SourceMode,
};
use crate::tree::{MalformedPolicy, NormalizeOptions};

pub const JENKINS_URL_ENV: &str = "JENKINS_URL";
pub const JENKINS_USERNAME_ENV: &str = "JENKINS_USERNAME";
pub const JENKINS_API_TOKEN_ENV: &str = "JENKINS_API_TOKEN";
pub const JENKINS_TEST_MODE_ENV: &str = "JENKINS_TEST_MODE";

/// Request timeout when not configured.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag
    CliFlag,
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl
    ConfigFile,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile => write!(f, "file"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// CLI overrides for resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub refresh_interval: Option<u64>,
    /// `--test-mode`; only an explicit `true` overrides
    pub test_mode: Option<bool>,
    /// `--strict`; only an explicit `true` overrides
    pub strict: Option<bool>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refresh_interval(mut self, secs: u64) -> Self {
        self.refresh_interval = Some(secs);
        self
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = Some(test_mode);
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }
}

/// Fully resolved settings with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub jenkins_url: Option<Resolved<String>>,
    pub username: Option<Resolved<String>>,
    pub api_token: Option<Resolved<String>>,
    pub folder: Option<Resolved<String>>,
    pub refresh_interval: Resolved<u64>,
    pub tree_depth: Resolved<u8>,
    pub request_timeout: Resolved<u64>,
    pub test_mode: Resolved<bool>,
    pub strict: Resolved<bool>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            jenkins_url: None,
            username: None,
            api_token: None,
            folder: None,
            refresh_interval: Resolved::new(DEFAULT_REFRESH_INTERVAL.as_secs(), ValueSource::Default),
            tree_depth: Resolved::new(DEFAULT_TREE_DEPTH, ValueSource::Default),
            request_timeout: Resolved::new(DEFAULT_REQUEST_TIMEOUT_SECS, ValueSource::Default),
            test_mode: Resolved::new(false, ValueSource::Default),
            strict: Resolved::new(false, ValueSource::Default),
        }
    }
}

/// One row of `cimon config show`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub value: Option<String>,
    pub source: Option<String>,
}

impl ResolvedConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.value)
    }

    pub fn source_mode(&self) -> SourceMode {
        SourceMode::from_test_mode(self.test_mode.value)
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        let policy = if self.strict.value {
            MalformedPolicy::Abort
        } else {
            MalformedPolicy::Skip
        };
        NormalizeOptions::default().with_policy(policy)
    }

    /// Whether URL, username and token are all present.
    pub fn has_credentials(&self) -> bool {
        self.jenkins_url.is_some() && self.username.is_some() && self.api_token.is_some()
    }

    /// Connection settings, if credentials are complete.
    pub fn jenkins_config(&self) -> Option<JenkinsConfig> {
        let (url, username, token) = (
            self.jenkins_url.as_ref()?,
            self.username.as_ref()?,
            self.api_token.as_ref()?,
        );
        let mut config = JenkinsConfig::new(&url.value, &username.value, &token.value);
        config.folder = self.folder.as_ref().map(|f| f.value.clone());
        config.tree_depth = self.tree_depth.value;
        config.timeout = Duration::from_secs(self.request_timeout.value);
        Some(config)
    }

    /// The live source these settings describe.
    ///
    /// Incomplete credentials yield [`ConfiguredSource::Unconfigured`], which
    /// reports the problem on every fetch rather than failing up front.
    pub fn job_source(&self) -> Result<ConfiguredSource> {
        let Some(config) = self.jenkins_config() else {
            tracing::info!("CI server credentials incomplete, live fetches will fall back");
            return Ok(ConfiguredSource::Unconfigured);
        };
        match JenkinsSource::new(config) {
            Ok(source) => Ok(ConfiguredSource::Jenkins(source)),
            Err(SourceError::CredentialsMissing) => Ok(ConfiguredSource::Unconfigured),
            Err(e) => Err(e.into()),
        }
    }

    /// Display rows with the token masked.
    pub fn entries(&self) -> Vec<ConfigEntry> {
        fn entry<T: ToString>(key: &'static str, value: Option<&Resolved<T>>) -> ConfigEntry {
            ConfigEntry {
                key,
                value: value.map(|r| r.value.to_string()),
                source: value.map(|r| r.source.to_string()),
            }
        }

        let mut token = entry("api-token", self.api_token.as_ref());
        token.value = self.masked_token();

        vec![
            entry("jenkins-url", self.jenkins_url.as_ref()),
            entry("username", self.username.as_ref()),
            token,
            entry("folder", self.folder.as_ref()),
            entry("refresh-interval", Some(&self.refresh_interval)),
            entry("tree-depth", Some(&self.tree_depth)),
            entry("request-timeout", Some(&self.request_timeout)),
            entry("test-mode", Some(&self.test_mode)),
            entry("strict", Some(&self.strict)),
        ]
    }

    /// The token with all but its first and last 4 characters hidden.
    pub fn masked_token(&self) -> Option<String> {
        self.api_token.as_ref().map(|r| {
            let chars: Vec<char> = r.value.chars().collect();
            if chars.len() <= 12 {
                "****".to_string()
            } else {
                let head: String = chars[..4].iter().collect();
                let tail: String = chars[chars.len() - 4..].iter().collect();
                format!("{}...{}", head, tail)
            }
        })
    }
}

/// Default location of config.kdl.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cimon").join("config.kdl"))
}

/// Read config.kdl. A missing file is an empty config.
pub fn load_config_file(path: &Path) -> Result<CimonConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file");
            return Ok(CimonConfig::default());
        }
        Err(e) => return Err(e.into()),
    };

    let doc: kdl::KdlDocument = content
        .parse()
        .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))?;
    if crate::config::schema::has_token_in_config(&doc) {
        tracing::warn!(
            path = %path.display(),
            "API token in config file is ignored; set {} instead",
            JENKINS_API_TOKEN_ENV
        );
    }

    let config = CimonConfig::from_kdl(&doc);
    config
        .validate()
        .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(config)
}

/// Resolve settings from `config_path` (or the default location), the
/// process environment and `overrides`.
pub fn resolve_config(
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig> {
    let file = match config_path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => load_config_file(&path)?,
        None => CimonConfig::default(),
    };
    resolve_with(&file, overrides, |name| std::env::var(name).ok())
}

/// Resolve settings from explicit inputs. `env` looks up an environment
/// variable; empty values count as unset.
pub fn resolve_with(
    file: &CimonConfig,
    overrides: &ConfigOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let env = |name: &str| {
        env(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let from_env = |name: &str| ValueSource::EnvVar(name.to_string());

    let mut result = ResolvedConfig::default();

    // Resolve jenkins_url
    if let Some(url) = env(JENKINS_URL_ENV) {
        result.jenkins_url = Some(Resolved::new(url, from_env(JENKINS_URL_ENV)));
    } else if let Some(ref url) = file.jenkins_url {
        result.jenkins_url = Some(Resolved::new(url.clone(), ValueSource::ConfigFile));
    }

    // Resolve username
    if let Some(username) = env(JENKINS_USERNAME_ENV) {
        result.username = Some(Resolved::new(username, from_env(JENKINS_USERNAME_ENV)));
    } else if let Some(ref username) = file.username {
        result.username = Some(Resolved::new(username.clone(), ValueSource::ConfigFile));
    }

    // Token: environment only
    if let Some(token) = env(JENKINS_API_TOKEN_ENV) {
        result.api_token = Some(Resolved::new(token, from_env(JENKINS_API_TOKEN_ENV)));
    }

    if let Some(ref folder) = file.folder {
        result.folder = Some(Resolved::new(folder.clone(), ValueSource::ConfigFile));
    }

    // Resolve refresh_interval
    if let Some(secs) = overrides.refresh_interval {
        if secs == 0 {
            return Err(crate::Error::InvalidInput(
                "refresh interval must be at least 1 second".to_string(),
            ));
        }
        result.refresh_interval = Resolved::new(secs, ValueSource::CliFlag);
    } else if let Some(secs) = file.refresh_interval {
        result.refresh_interval = Resolved::new(secs, ValueSource::ConfigFile);
    }

    if let Some(depth) = file.tree_depth {
        result.tree_depth = Resolved::new(depth, ValueSource::ConfigFile);
    }
    if let Some(timeout) = file.request_timeout {
        result.request_timeout = Resolved::new(timeout, ValueSource::ConfigFile);
    }

    // Resolve test_mode
    let env_test_mode = env(JENKINS_TEST_MODE_ENV).and_then(|raw| {
        let parsed = parse_bool(&raw);
        if parsed.is_none() {
            tracing::warn!(value = %raw, "ignoring unrecognized {}", JENKINS_TEST_MODE_ENV);
        }
        parsed
    });
    if overrides.test_mode == Some(true) {
        result.test_mode = Resolved::new(true, ValueSource::CliFlag);
    } else if let Some(test_mode) = env_test_mode {
        result.test_mode = Resolved::new(test_mode, from_env(JENKINS_TEST_MODE_ENV));
    } else if let Some(test_mode) = file.test_mode {
        result.test_mode = Resolved::new(test_mode, ValueSource::ConfigFile);
    }

    // Resolve strict
    if overrides.strict == Some(true) {
        result.strict = Resolved::new(true, ValueSource::CliFlag);
    } else if let Some(strict) = file.strict {
        result.strict = Resolved::new(strict, ValueSource::ConfigFile);
    }

    Ok(result)
}

/// Parse a boolean environment value.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
