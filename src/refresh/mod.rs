//! Refresh orchestration: fetch, normalize, publish, and fall back.
//!
//! [`RefreshController`] is the synchronous state machine. It hands out a
//! [`RefreshTicket`] when a refresh begins and only accepts the outcome of
//! the most recent ticket, so a slow fetch can never overwrite the result of
//! a newer one. [`service`] drives a controller from a tokio task.
//!
//! ```text
//! Idle/Loaded/Failed --begin--> Loading --finish(Ok)--> Loaded
//!                                       --finish(Err)-> Failed (+ baseline data)
//! ```

pub mod service;

pub use service::{RefreshCommand, RefreshHandle, RefreshSettings, spawn};

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{FetchPayload, JobList};
use crate::source::{JobSource, SourceError, SourceMode, baseline};
use crate::tree::{NormalizeOptions, SkippedRecord, normalize_with};

/// Interval between timed refreshes when not configured.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Orchestrator state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl RefreshPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshPhase::Idle => "idle",
            RefreshPhase::Loading => "loading",
            RefreshPhase::Loaded => "loaded",
            RefreshPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for RefreshPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What asked for a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTrigger {
    Initial,
    Manual,
    ModeToggle,
    Timer,
}

/// Everything a view needs, replaced as a whole on every change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSnapshot {
    pub phase: RefreshPhase,
    pub jobs: JobList,
    /// Dataset the user asked for
    pub mode: SourceMode,
    /// True when the data shown is sample data (requested or fallen back to)
    pub test_mode: bool,
    /// Advisory message: a source warning or the reason for falling back
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Records dropped by the normalizer on the last load
    pub skipped: Vec<SkippedRecord>,
    /// Number of refreshes begun so far
    pub generation: u64,
}

/// Proof of a begun refresh; only the latest ticket is accepted by `finish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
    mode: SourceMode,
    trigger: RefreshTrigger,
}

impl RefreshTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    pub fn trigger(&self) -> RefreshTrigger {
        self.trigger
    }
}

/// Synchronous refresh state machine.
#[derive(Debug)]
pub struct RefreshController {
    snapshot: DashboardSnapshot,
    options: NormalizeOptions,
}

impl RefreshController {
    /// Create an idle controller.
    ///
    /// `options` apply to live data; baseline data is always loaded collapsed.
    pub fn new(mode: SourceMode, options: NormalizeOptions) -> Self {
        Self {
            snapshot: DashboardSnapshot {
                mode,
                test_mode: mode.is_test_mode(),
                ..DashboardSnapshot::default()
            },
            options,
        }
    }

    pub fn snapshot(&self) -> &DashboardSnapshot {
        &self.snapshot
    }

    pub fn mode(&self) -> SourceMode {
        self.snapshot.mode
    }

    pub fn is_loading(&self) -> bool {
        self.snapshot.phase == RefreshPhase::Loading
    }

    /// Switch datasets. Takes effect on the next `begin`.
    pub fn set_mode(&mut self, mode: SourceMode) {
        self.snapshot.mode = mode;
    }

    /// Enter `Loading` and supersede any refresh still in flight.
    pub fn begin(&mut self, trigger: RefreshTrigger) -> RefreshTicket {
        self.snapshot.generation += 1;
        self.snapshot.phase = RefreshPhase::Loading;
        self.snapshot.error = None;

        let ticket = RefreshTicket {
            generation: self.snapshot.generation,
            mode: self.snapshot.mode,
            trigger,
        };
        tracing::debug!(
            generation = ticket.generation,
            mode = %ticket.mode,
            ?trigger,
            "refresh started"
        );
        ticket
    }

    /// Whether `ticket` is still the latest refresh.
    pub fn is_current(&self, ticket: &RefreshTicket) -> bool {
        ticket.generation == self.snapshot.generation
    }

    /// Apply the outcome of a fetch.
    ///
    /// Returns false, leaving state untouched, when the ticket has been
    /// superseded. Failures never propagate: they move to `Failed` and
    /// replace the tree with the baseline dataset.
    pub fn finish(
        &mut self,
        ticket: RefreshTicket,
        outcome: Result<FetchPayload, SourceError>,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.is_current(&ticket) {
            tracing::debug!(
                stale = ticket.generation,
                current = self.snapshot.generation,
                "discarding superseded refresh result"
            );
            return false;
        }

        let options = match ticket.mode {
            SourceMode::Live => self.options,
            SourceMode::Baseline => NormalizeOptions::collapsed().with_policy(self.options.policy),
        };

        let loaded = outcome
            .and_then(|payload| match payload.jobs {
                Some(jobs) => Ok((jobs, payload.test_mode, payload.error)),
                None => Err(SourceError::MissingJobs),
            })
            .map_err(crate::Error::from)
            .and_then(|(jobs, test_mode, advisory)| {
                normalize_with(&jobs, &[], &options).map(|report| (report, test_mode, advisory))
            });

        match loaded {
            Ok((report, test_mode, advisory)) => {
                if let Some(message) = &advisory {
                    tracing::warn!(%message, "source reported an advisory");
                }
                tracing::info!(
                    generation = ticket.generation,
                    jobs = report.jobs.len(),
                    skipped = report.skipped.len(),
                    "refresh loaded"
                );
                self.snapshot.phase = RefreshPhase::Loaded;
                self.snapshot.jobs = report.jobs;
                self.snapshot.skipped = report.skipped;
                self.snapshot.test_mode = test_mode || ticket.mode.is_test_mode();
                self.snapshot.error = advisory;
                self.snapshot.last_updated = Some(now);
            }
            Err(e) => {
                tracing::warn!(error = %e, "refresh failed, falling back to baseline data");
                self.snapshot.phase = RefreshPhase::Failed;
                self.snapshot.jobs = baseline::baseline_tree(now.timestamp_millis());
                self.snapshot.skipped = Vec::new();
                self.snapshot.test_mode = true;
                self.snapshot.error = Some(format!(
                    "Data load failed: {}. Showing baseline data.",
                    e
                ));
            }
        }
        true
    }
}

/// Run a single refresh cycle to completion.
///
/// Used by one-shot commands; the dashboard uses [`spawn`] instead.
pub async fn refresh_once<S: JobSource>(
    source: &S,
    mode: SourceMode,
    options: NormalizeOptions,
) -> DashboardSnapshot {
    let mut controller = RefreshController::new(mode, options);
    let ticket = controller.begin(RefreshTrigger::Initial);
    let outcome = fetch_for(source, ticket.mode()).await;
    controller.finish(ticket, outcome, Utc::now());
    controller.snapshot().clone()
}

/// Fetch from `source`, or load the baseline dataset in baseline mode.
pub(crate) async fn fetch_for<S: JobSource>(
    source: &S,
    mode: SourceMode,
) -> Result<FetchPayload, SourceError> {
    match mode {
        SourceMode::Live => source.fetch().await,
        SourceMode::Baseline => Ok(baseline::baseline_payload(Utc::now().timestamp_millis())),
    }
}
