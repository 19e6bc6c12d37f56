//! Configuration for cimon.
//!
//! ## config.kdl
//!
//! Located at `$CIMON_CONFIG` or `~/.config/cimon/config.kdl`. Contains the
//! CI server URL and username, an optional folder, refresh and request
//! timing, and the `test-mode` / `strict` switches. See [`schema`].
//!
//! ## Secrets
//!
//! The API token is read from `JENKINS_API_TOKEN` only and is never written
//! to or read from disk.
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    ConfigEntry, ConfigOverrides, JENKINS_API_TOKEN_ENV, JENKINS_TEST_MODE_ENV, JENKINS_URL_ENV,
    JENKINS_USERNAME_ENV, Resolved, ResolvedConfig, ValueSource, default_config_path,
    load_config_file, resolve_config, resolve_with,
};
pub use schema::CimonConfig;
