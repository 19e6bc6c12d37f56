//! cimon CLI - A terminal dashboard for CI job trees.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process;

use cimon::cli::{Cli, Commands, ConfigCommands};
use cimon::commands::{self, CommandResult, JobsOptions};
use cimon::config::{ConfigOverrides, resolve_config};
use cimon::logging;
use cimon::models::{SortConfig, SortDirection};
use cimon::source::{ConfiguredSource, FileSource, SourceMode};
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    let result = run_command(cli.command, cli.config_path.as_deref(), human);

    // Handle result
    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!(
                r#"{{"error": {}}}"#,
                serde_json::Value::String(e.to_string())
            );
        }
        process::exit(1);
    }
}

fn run_command(
    command: Option<Commands>,
    config_path: Option<&Path>,
    human: bool,
) -> Result<(), cimon::Error> {
    match command {
        Some(Commands::Jobs {
            query,
            sort,
            desc,
            toggle,
            test_mode,
            from_file,
            strict,
            collapsed,
            flat,
        }) => {
            logging::init_stderr()?;
            let view = JobsOptions {
                query,
                sort: sort.map(|key| SortConfig {
                    key,
                    direction: if desc {
                        SortDirection::Descending
                    } else {
                        SortDirection::Ascending
                    },
                }),
                toggles: toggle,
                collapsed,
                flat,
            };
            run_jobs(config_path, test_mode, strict, from_file, &view, human)
        }
        Some(Commands::Config { command }) => {
            logging::init_stderr()?;
            match command {
                ConfigCommands::Show => output(&commands::config_show(config_path)?, human),
                ConfigCommands::Path => output(&commands::config_path(config_path), human),
            }
            Ok(())
        }
        #[cfg(feature = "tui")]
        Some(Commands::Tui {
            interval,
            test_mode,
            strict,
        }) => run_tui(config_path, interval, test_mode, strict),
        #[cfg(feature = "tui")]
        None => run_tui(config_path, None, false, false),
        #[cfg(not(feature = "tui"))]
        None => {
            logging::init_stderr()?;
            run_jobs(config_path, false, false, None, &JobsOptions::default(), human)
        }
    }
}

fn run_jobs(
    config_path: Option<&Path>,
    test_mode: bool,
    strict: bool,
    from_file: Option<PathBuf>,
    view: &JobsOptions,
    human: bool,
) -> Result<(), cimon::Error> {
    let overrides = ConfigOverrides::new()
        .with_test_mode(test_mode)
        .with_strict(strict);
    let resolved = resolve_config(config_path, &overrides)?;

    // A payload file is always read, whatever test mode the environment asks for
    let (source, mode) = match from_file {
        Some(path) => (
            ConfiguredSource::File(FileSource::new(path)),
            SourceMode::Live,
        ),
        None => (resolved.job_source()?, resolved.source_mode()),
    };
    let normalize = resolved.normalize_options();

    let result = block_on(commands::jobs(&source, mode, normalize, view))??;
    output(&result, human);
    Ok(())
}

#[cfg(feature = "tui")]
fn run_tui(
    config_path: Option<&Path>,
    interval: Option<u64>,
    test_mode: bool,
    strict: bool,
) -> Result<(), cimon::Error> {
    use cimon::refresh::RefreshSettings;

    // Must stay alive until exit so buffered log lines are flushed
    let _guard = logging::init_file(&logging::log_dir())?;

    let mut overrides = ConfigOverrides::new()
        .with_test_mode(test_mode)
        .with_strict(strict);
    if let Some(secs) = interval {
        overrides = overrides.with_refresh_interval(secs);
    }
    let resolved = resolve_config(config_path, &overrides)?;
    let source = resolved.job_source()?;
    let settings = RefreshSettings {
        interval: resolved.refresh_interval(),
        mode: resolved.source_mode(),
        options: resolved.normalize_options(),
    };

    block_on(cimon::tui::run_tui(source, settings))?
}

/// Run a future to completion on a fresh multi-threaded runtime.
fn block_on<F: Future>(future: F) -> Result<F::Output, cimon::Error> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| cimon::Error::Other(format!("Failed to create runtime: {}", e)))?;
    Ok(runtime.block_on(future))
}

fn output<T: CommandResult>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
