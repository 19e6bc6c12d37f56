//! Tracing subscriber setup.
//!
//! The filter comes from `CIMON_LOG` (same syntax as `RUST_LOG`). One-shot
//! commands log to stderr so stdout stays clean JSON. The dashboard owns the
//! terminal, so it logs JSON lines to a daily rolling file instead.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::{Error, Result};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "CIMON_LOG";

/// Level used by one-shot commands when `CIMON_LOG` is unset.
pub const CLI_DEFAULT_LEVEL: &str = "warn";

/// Level used by the dashboard when `CIMON_LOG` is unset.
pub const TUI_DEFAULT_LEVEL: &str = "info";

const LOG_FILE_PREFIX: &str = "cimon.log";

/// Filter from `CIMON_LOG`, or `default` when unset or invalid.
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Directory for dashboard log files.
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("cimon")
        .join("logs")
}

/// Log human-readable lines to stderr.
pub fn init_stderr() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(CLI_DEFAULT_LEVEL))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| Error::Other(format!("failed to initialize logging: {}", e)))
}

/// Log JSON lines to a daily rolling file in `dir`.
///
/// The returned guard flushes buffered lines when dropped; hold it for the
/// life of the program.
pub fn init_file(dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter(TUI_DEFAULT_LEVEL))
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| Error::Other(format!("failed to initialize logging: {}", e)))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        dir = %dir.display(),
        "cimon starting"
    );
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dir_is_namespaced() {
        let dir = log_dir();
        assert!(dir.ends_with("cimon/logs"));
    }

    #[test]
    #[serial_test::serial]
    fn test_env_filter_reads_cimon_log() {
        // SAFETY: serialized with other env-mutating tests
        unsafe {
            std::env::remove_var(LOG_ENV);
        }
        assert_eq!(env_filter("warn").to_string(), "warn");

        unsafe {
            std::env::set_var(LOG_ENV, "debug");
        }
        let filter = env_filter("warn");
        unsafe {
            std::env::remove_var(LOG_ENV);
        }
        assert_eq!(filter.to_string(), "debug");
    }
}
