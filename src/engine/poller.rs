use std::{
    sync::{
        Arc,
        atomic::{AtomicU8, AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::Utc;
use futures::{StreamExt, stream};
use serde::Serialize;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinSet,
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;

use super::PollerMetrics;
use crate::{
    config::{AppConfig, ColumnMapping},
    models::{SnapshotFailure, TickSummary},
    parser::{self, ParseOutcome},
    providers::{SnapshotSource, SourceError},
    store::SeriesStore,
};

/// Lifecycle of the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PollerState {
    /// Waiting for the next tick.
    Idle = 0,
    /// A tick is in flight.
    Running = 1,
    /// Stopped for good. No tick will run again.
    Stopped = 2,
}

impl PollerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

/// What happened to one tick request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The source was listed and the parsed rows were merged.
    Completed(TickSummary),
    /// Another tick was still running. Nothing was listed, fetched or merged.
    Skipped,
    /// The source could not be listed. Retried on the next tick.
    SourceUnavailable(SourceError),
    /// The poller was stopped before or during the tick.
    Cancelled,
}

/// The atomically held `PollerState`.
#[derive(Debug, Clone)]
struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(PollerState::Idle as u8)))
    }

    fn load(&self) -> PollerState {
        PollerState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn transition(&self, from: PollerState, to: PollerState) -> bool {
        self.0.compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }

    fn stop(&self) {
        self.0.store(PollerState::Stopped as u8, Ordering::Release);
    }
}

/// Returns the state to `Idle` when a tick ends, however it ends.
struct RunningGuard<'a>(&'a SharedState);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        // Fails harmlessly once the poller is stopped.
        self.0.transition(PollerState::Running, PollerState::Idle);
    }
}

/// Everything a tick needs, shared between the run loop, spawned ticks and
/// handles.
struct TickRunner {
    source: Arc<dyn SnapshotSource>,
    store: Arc<SeriesStore>,
    columns: ColumnMapping,
    fetch_concurrency: usize,
    state: SharedState,
    sequence: AtomicU64,
    metrics: PollerMetrics,
    cancellation_token: CancellationToken,
}

impl TickRunner {
    async fn tick(&self) -> TickOutcome {
        let outcome = self.try_tick().await;
        self.metrics.record(&outcome).await;
        outcome
    }

    async fn try_tick(&self) -> TickOutcome {
        if !self.state.transition(PollerState::Idle, PollerState::Running) {
            return match self.state.load() {
                PollerState::Stopped => TickOutcome::Cancelled,
                _ => {
                    tracing::debug!("Previous tick still running, skipping this one.");
                    TickOutcome::Skipped
                }
            };
        }
        let _running = RunningGuard(&self.state);
        let tick = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;

        tokio::select! {
            biased;

            _ = self.cancellation_token.cancelled() => {
                tracing::info!(tick, "Tick abandoned on shutdown.");
                TickOutcome::Cancelled
            }

            outcome = self.execute(tick) => outcome,
        }
    }

    /// Lists, fetches and parses every snapshot, then merges all rows as one
    /// batch. The merge itself never awaits, so once it starts it finishes.
    async fn execute(&self, tick: u64) -> TickOutcome {
        let started_at = Utc::now();

        let names = match self.source.list_names().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(tick, error = %e, "Snapshot listing failed. Retrying next tick.");
                return TickOutcome::SourceUnavailable(e);
            }
        };
        tracing::debug!(tick, snapshots = names.len(), "Listed snapshots.");

        let source = &self.source;
        let columns = &self.columns;
        let results: Vec<_> = stream::iter(names.iter().cloned())
            .map(|name| async move {
                let parsed = source.fetch(&name).await.map(|raw| parser::parse(&raw, columns));
                (name, parsed)
            })
            .buffered(self.fetch_concurrency)
            .collect()
            .await;

        let mut rows = Vec::new();
        let mut parse_errors = 0;
        let mut failures = Vec::new();
        for (name, result) in results {
            match result {
                Ok(outcome) => {
                    for error in &outcome.errors {
                        tracing::debug!(
                            tick,
                            %name,
                            line = error.line,
                            error = %error.kind,
                            "Rejected snapshot row."
                        );
                    }
                    parse_errors += outcome.errors.len();
                    if let Some(reason) = unusable(&outcome) {
                        tracing::warn!(tick, %name, error = %reason, "Snapshot produced no rows.");
                        failures.push(SnapshotFailure { name, error: reason });
                        continue;
                    }
                    if !outcome.errors.is_empty() {
                        tracing::warn!(
                            tick,
                            %name,
                            rejected = outcome.errors.len(),
                            "Snapshot contained invalid rows."
                        );
                    }
                    rows.extend(outcome.rows);
                }
                Err(e) => {
                    tracing::warn!(
                        tick,
                        %name,
                        error = %e,
                        "Snapshot fetch failed. Skipping it this tick."
                    );
                    failures.push(SnapshotFailure { name, error: e.to_string() });
                }
            }
        }

        let rows_merged = rows.len();
        let report = self.store.merge(rows);

        tracing::info!(
            tick,
            snapshots = names.len(),
            rows = rows_merged,
            inserted = report.inserted,
            updated = report.updated,
            evicted = report.evicted,
            parse_errors,
            failures = failures.len(),
            "Tick completed."
        );

        TickOutcome::Completed(TickSummary {
            tick,
            started_at,
            names,
            rows_merged,
            report,
            parse_errors,
            failures,
        })
    }
}

/// Describes why a parsed snapshot contributed nothing, if it was rejected
/// rather than merely empty.
fn unusable(outcome: &ParseOutcome) -> Option<String> {
    if !outcome.rows.is_empty() {
        return None;
    }
    match outcome.errors.as_slice() {
        [] => None,
        [single] => Some(single.to_string()),
        errors => Some(format!("all {} rows rejected, first: {}", errors.len(), errors[0])),
    }
}

/// A cheap, cloneable handle for controlling a running poller.
#[derive(Clone)]
pub struct PollerHandle {
    runner: Arc<TickRunner>,
    kick_tx: mpsc::Sender<()>,
}

impl PollerHandle {
    /// Asks the run loop for an immediate tick.
    ///
    /// Returns `false` if the poller is stopped. A kick arriving while one is
    /// already pending is folded into it. A kick that lands while a tick is
    /// running is skipped like any other overlapping tick.
    pub fn kick(&self) -> bool {
        if self.state() == PollerState::Stopped {
            return false;
        }
        match self.kick_tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Closed(())) => false,
        }
    }

    /// Runs one tick on the caller's task, bypassing the schedule.
    pub async fn tick(&self) -> TickOutcome {
        self.runner.tick().await
    }

    /// Stops the poller. No further ticks run and an in-flight tick is
    /// abandoned at its next suspension point.
    pub fn stop(&self) {
        self.runner.cancellation_token.cancel();
        self.runner.state.stop();
    }

    /// The current lifecycle state.
    pub fn state(&self) -> PollerState {
        self.runner.state.load()
    }

    /// The poller's activity counters.
    pub fn metrics(&self) -> &PollerMetrics {
        &self.runner.metrics
    }
}

/// Drives the snapshot source on a fixed cadence.
///
/// The first tick fires as soon as [`Poller::run`] starts. Later ticks follow
/// the configured interval measured between scheduling instants, and each
/// tick runs as its own task, so a slow tick never delays the schedule. A
/// tick that comes due while the previous one is still running is skipped.
pub struct Poller {
    handle: PollerHandle,
    interval: Duration,
    kick_rx: mpsc::Receiver<()>,
}

impl Poller {
    /// Creates a new poller. Cancelling `cancellation_token` stops it, as does
    /// [`PollerHandle::stop`], which leaves the parent token untouched.
    pub fn new(
        config: &AppConfig,
        source: Arc<dyn SnapshotSource>,
        store: Arc<SeriesStore>,
        cancellation_token: CancellationToken,
    ) -> Self {
        let (kick_tx, kick_rx) = mpsc::channel(1);
        let runner = Arc::new(TickRunner {
            source,
            store,
            columns: config.columns.clone(),
            fetch_concurrency: config.fetch_concurrency.max(1),
            state: SharedState::new(),
            sequence: AtomicU64::new(0),
            metrics: PollerMetrics::default(),
            cancellation_token: cancellation_token.child_token(),
        });
        let handle = PollerHandle { runner, kick_tx };
        Self { handle, interval: config.polling_interval_ms, kick_rx }
    }

    /// Returns a handle to this poller.
    pub fn handle(&self) -> PollerHandle {
        self.handle.clone()
    }

    /// Runs one tick on the caller's task.
    pub async fn tick(&self) -> TickOutcome {
        self.handle.tick().await
    }

    /// Starts the long-running schedule loop.
    pub async fn run(self) {
        let Self { handle, interval: period, mut kick_rx } = self;
        let token = handle.runner.cancellation_token.clone();

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = JoinSet::new();

        tracing::info!(interval_ms = period.as_millis() as u64, "Poller started.");
        loop {
            tokio::select! {
                biased;

                _ = token.cancelled() => {
                    tracing::info!("Poller cancellation signal received, shutting down...");
                    break;
                }

                Some(joined) = ticks.join_next(), if !ticks.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "Tick task failed.");
                    }
                }

                _ = interval.tick() => spawn_tick(&handle, &mut ticks),

                Some(()) = kick_rx.recv() => {
                    tracing::debug!("Explicit refresh requested.");
                    spawn_tick(&handle, &mut ticks);
                }
            }
        }

        handle.runner.state.stop();
        while let Some(joined) = ticks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Tick task failed during shutdown.");
            }
        }
        tracing::info!("Poller has shut down.");
    }
}

fn spawn_tick(handle: &PollerHandle, ticks: &mut JoinSet<TickOutcome>) {
    let handle = handle.clone();
    ticks.spawn(async move { handle.tick().await });
}
