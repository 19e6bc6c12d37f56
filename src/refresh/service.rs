//! Background refresh task.
//!
//! One tokio task owns the [`RefreshController`]. Requests arrive over an
//! mpsc channel, a timer fires every `interval`, and each state change is
//! published whole through a `watch` channel. At most one fetch is in flight:
//! an explicit request aborts the current fetch and starts a new one, while a
//! timer tick that lands during a fetch is skipped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{
    DEFAULT_REFRESH_INTERVAL, DashboardSnapshot, RefreshController, RefreshTicket, RefreshTrigger,
    fetch_for,
};
use crate::models::FetchPayload;
use crate::source::{JobSource, SourceError, SourceMode};
use crate::tree::NormalizeOptions;

/// Requests accepted by the refresh task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshCommand {
    /// Refresh now, superseding any fetch in flight
    Refresh,
    /// Switch dataset and refresh
    SetMode(SourceMode),
    /// Flip between live and baseline data and refresh
    ToggleMode,
    Shutdown,
}

/// Settings for [`spawn`].
#[derive(Debug, Clone, Copy)]
pub struct RefreshSettings {
    pub interval: Duration,
    pub mode: SourceMode,
    pub options: NormalizeOptions,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REFRESH_INTERVAL,
            mode: SourceMode::Live,
            options: NormalizeOptions::default(),
        }
    }
}

/// Client side of a running refresh task.
#[derive(Debug)]
pub struct RefreshHandle {
    commands: mpsc::UnboundedSender<RefreshCommand>,
    snapshots: watch::Receiver<DashboardSnapshot>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn refresh(&self) {
        self.send(RefreshCommand::Refresh);
    }

    pub fn set_mode(&self, mode: SourceMode) {
        self.send(RefreshCommand::SetMode(mode));
    }

    pub fn toggle_mode(&self) {
        self.send(RefreshCommand::ToggleMode);
    }

    /// A receiver that is notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.clone()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Stop the task and wait for it, cancelling any fetch in flight.
    pub async fn shutdown(self) {
        self.send(RefreshCommand::Shutdown);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "refresh task ended abnormally");
        }
    }

    fn send(&self, command: RefreshCommand) {
        if self.commands.send(command).is_err() {
            tracing::debug!(?command, "refresh task is gone, dropping command");
        }
    }
}

type Completion = (RefreshTicket, Result<FetchPayload, SourceError>);

struct RefreshService<S> {
    source: Arc<S>,
    controller: RefreshController,
    interval: Duration,
    publisher: watch::Sender<DashboardSnapshot>,
    in_flight: Option<JoinHandle<()>>,
    completions: mpsc::UnboundedSender<Completion>,
}

/// Start the refresh task on the current tokio runtime.
///
/// The first refresh begins immediately.
pub fn spawn<S: JobSource>(source: S, settings: RefreshSettings) -> RefreshHandle {
    let controller = RefreshController::new(settings.mode, settings.options);
    let (publisher, snapshots) = watch::channel(controller.snapshot().clone());
    let (commands, command_rx) = mpsc::unbounded_channel();
    let (completions, completion_rx) = mpsc::unbounded_channel();

    tracing::info!(
        source = %source.describe(),
        interval_secs = settings.interval.as_secs(),
        mode = %settings.mode,
        "starting refresh task"
    );

    let service = RefreshService {
        source: Arc::new(source),
        controller,
        interval: settings.interval,
        publisher,
        in_flight: None,
        completions,
    };
    let task = tokio::spawn(service.run(command_rx, completion_rx));

    RefreshHandle {
        commands,
        snapshots,
        task,
    }
}

impl<S: JobSource> RefreshService<S> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<RefreshCommand>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + self.interval,
            self.interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.start(RefreshTrigger::Initial);

        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(RefreshCommand::Refresh) => {
                            self.start(RefreshTrigger::Manual);
                            ticker.reset();
                        }
                        Some(RefreshCommand::SetMode(mode)) => {
                            self.controller.set_mode(mode);
                            self.start(RefreshTrigger::ModeToggle);
                            ticker.reset();
                        }
                        Some(RefreshCommand::ToggleMode) => {
                            let mode = self.controller.mode().toggled();
                            self.controller.set_mode(mode);
                            self.start(RefreshTrigger::ModeToggle);
                            ticker.reset();
                        }
                        Some(RefreshCommand::Shutdown) | None => break,
                    }
                }
                Some((ticket, outcome)) = completions.recv() => {
                    if self.controller.finish(ticket, outcome, Utc::now()) {
                        self.in_flight = None;
                        self.publish();
                    }
                }
                _ = ticker.tick() => {
                    if self.controller.is_loading() {
                        tracing::debug!("refresh still in flight, skipping timer tick");
                    } else {
                        self.start(RefreshTrigger::Timer);
                    }
                }
            }
        }

        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        tracing::info!("refresh task stopped");
    }

    fn start(&mut self, trigger: RefreshTrigger) {
        if let Some(previous) = self.in_flight.take() {
            previous.abort();
        }

        let ticket = self.controller.begin(trigger);
        self.publish();

        let source = Arc::clone(&self.source);
        let completions = self.completions.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let outcome = fetch_for(source.as_ref(), ticket.mode()).await;
            // The receiver only closes on shutdown
            let _ = completions.send((ticket, outcome));
        }));
    }

    fn publish(&self) {
        self.publisher.send_replace(self.controller.snapshot().clone());
    }
}
