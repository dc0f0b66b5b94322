//! Background progress tracker for dispatched batches.
//!
//! Polls per-item status rows on a growing interval until every item
//! resolved, the poll budget runs out, or the caller cancels. The tracker
//! only observes; cancelling it never aborts the batch worker.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;
use varsync_core::{
    AppConfig, BatchOutcome, ProgressSnapshot, TrackerReport, TrackerState,
};

use crate::ports::{ProgressObserver, StatusSource};

const DEFAULT_INITIAL_INTERVAL_MS: u64 = 500;
const DEFAULT_GROWTH_FACTOR: f64 = 1.2;
const DEFAULT_MAX_INTERVAL_MS: u64 = 3_000;
const DEFAULT_MAX_POLLS: u32 = 60;

/// Polling schedule of a [`ProgressTracker`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    pub initial_interval: Duration,
    /// Applied to the interval after every non-terminal poll; `>= 1.0`.
    pub growth_factor: f64,
    pub max_interval: Duration,
    /// Hard cap on status polls before giving up with `TimedOut`.
    pub max_polls: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(DEFAULT_INITIAL_INTERVAL_MS),
            growth_factor: DEFAULT_GROWTH_FACTOR,
            max_interval: Duration::from_millis(DEFAULT_MAX_INTERVAL_MS),
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

impl TrackerConfig {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            initial_interval: Duration::from_millis(config.tracker_initial_interval_ms),
            growth_factor: config.tracker_growth_factor,
            max_interval: Duration::from_millis(config.tracker_max_interval_ms),
            max_polls: config.tracker_max_polls,
        }
    }

    /// The interval after `current`, grown by `growth_factor` and capped at
    /// `max_interval`.
    #[must_use]
    pub fn next_interval(&self, current: Duration) -> Duration {
        current
            .mul_f64(self.growth_factor.max(1.0))
            .min(self.max_interval)
    }
}

/// Watches one batch until it reaches a terminal state.
pub struct ProgressTracker {
    batch_id: Uuid,
    expected: usize,
    source: Arc<dyn StatusSource>,
    observer: Arc<dyn ProgressObserver>,
    config: TrackerConfig,
    cancel: CancellationToken,
}

impl ProgressTracker {
    pub fn new(
        batch_id: Uuid,
        expected: usize,
        source: Arc<dyn StatusSource>,
        observer: Arc<dyn ProgressObserver>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            batch_id,
            expected,
            source,
            observer,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops this tracker when cancelled. Cancelling is
    /// idempotent and a no-op once the tracker finished.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the tracker on its own task.
    #[must_use]
    pub fn spawn(self) -> TrackerHandle {
        let cancel = self.cancel.clone();
        let join = tokio::spawn(self.run());
        TrackerHandle { cancel, join }
    }

    /// Polls until a terminal state and returns the report.
    ///
    /// Sleeps one interval before every poll, including the first. The
    /// observer's `on_finished` is called exactly once, right before
    /// returning.
    pub async fn run(self) -> TrackerReport {
        let mut interval = self.config.initial_interval;
        let mut polls = 0u32;
        let mut last = ProgressSnapshot {
            expected: self.expected,
            ..ProgressSnapshot::default()
        };

        let state = loop {
            if polls >= self.config.max_polls {
                break TrackerState::TimedOut;
            }

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break TrackerState::Cancelled,
                () = tokio::time::sleep(interval) => {}
            }

            polls += 1;
            match self.source.item_statuses(self.batch_id).await {
                Ok(items) => {
                    last = ProgressSnapshot::from_items(self.expected, &items);
                    if last.is_complete() {
                        break TrackerState::Completed(BatchOutcome::classify(
                            last.success,
                            last.failed,
                        ));
                    }
                    debug!(
                        batch_id = %self.batch_id,
                        poll = polls,
                        completed = last.completed,
                        expected = last.expected,
                        "batch still running"
                    );
                    self.observer.on_progress(self.batch_id, &last);
                }
                // A failed poll still counts against the budget.
                Err(e) => {
                    warn!(batch_id = %self.batch_id, poll = polls, error = %e, "status poll failed");
                }
            }

            interval = self.config.next_interval(interval);
        };

        let report = TrackerReport { state, polls, last };
        self.observer.on_finished(self.batch_id, &report);
        report
    }
}

/// Handle to a spawned [`ProgressTracker`].
pub struct TrackerHandle {
    cancel: CancellationToken,
    join: JoinHandle<TrackerReport>,
}

impl TrackerHandle {
    /// Stops polling. Safe to call repeatedly and after the tracker finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the terminal report.
    ///
    /// # Errors
    ///
    /// Returns the [`tokio::task::JoinError`] if the tracker task panicked.
    pub async fn wait(self) -> Result<TrackerReport, tokio::task::JoinError> {
        self.join.await
    }
}

/// Observer that reports progress through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_progress(&self, batch_id: Uuid, snapshot: &ProgressSnapshot) {
        info!(
            batch_id = %batch_id,
            completed = snapshot.completed,
            expected = snapshot.expected,
            success = snapshot.success,
            failed = snapshot.failed,
            "batch progress"
        );
    }

    fn on_finished(&self, batch_id: Uuid, report: &TrackerReport) {
        match report.state {
            TrackerState::Completed(BatchOutcome::AllSucceeded { success }) => {
                info!(batch_id = %batch_id, success, "batch completed");
            }
            TrackerState::Completed(BatchOutcome::AllFailed { failed }) => {
                warn!(batch_id = %batch_id, failed, "batch failed");
            }
            TrackerState::Completed(BatchOutcome::Mixed { success, failed }) => {
                warn!(batch_id = %batch_id, success, failed, "batch partially succeeded");
            }
            TrackerState::TimedOut => {
                warn!(
                    batch_id = %batch_id,
                    polls = report.polls,
                    completed = report.last.completed,
                    expected = report.last.expected,
                    "stopped tracking batch before it finished"
                );
            }
            TrackerState::Cancelled => info!(batch_id = %batch_id, "batch tracking cancelled"),
        }
    }
}
