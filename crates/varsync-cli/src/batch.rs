//! Batch command handlers for the CLI.
//!
//! A batch is dispatched in the background and then tracked in the
//! foreground. Ctrl-C stops tracking only; in-flight syncs are allowed to
//! finish unless Ctrl-C is pressed a second time.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;
use varsync_core::{BatchOutcome, ProgressSnapshot, TrackerReport, TrackerState};
use varsync_sync::{
    BatchDispatcher, DispatchedBatch, PgStore, ProgressObserver, ProgressTracker, SyncRequest,
    TrackerConfig,
};

use crate::sync::build_orchestrator;

/// Shape of the YAML file accepted by `batch`.
#[derive(Debug, Deserialize)]
pub(crate) struct BatchFile {
    pub products: Vec<SyncRequest>,
}

/// Parse a batch file from YAML text.
///
/// # Errors
///
/// Returns an error if the text is not a valid batch file or lists no
/// products.
pub(crate) fn parse_batch_file(text: &str) -> anyhow::Result<Vec<SyncRequest>> {
    let file: BatchFile = serde_yaml::from_str(text)?;
    if file.products.is_empty() {
        anyhow::bail!("batch file lists no products");
    }
    Ok(file.products)
}

/// Read and parse a batch file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub(crate) fn load_batch_file(path: &Path) -> anyhow::Result<Vec<SyncRequest>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    parse_batch_file(&text)
}

/// Dispatch `requests` as a new batch and track it to the end.
///
/// # Errors
///
/// Returns an error if the batch cannot be dispatched or the tracker task
/// panics. Per-item failures are reported, not propagated.
pub(crate) async fn run_batch(
    pool: &sqlx::PgPool,
    config: &varsync_core::AppConfig,
    requests: Vec<SyncRequest>,
) -> anyhow::Result<()> {
    let (dispatcher, store) = build_dispatcher(pool, config)?;
    let batch = dispatcher.dispatch(requests).await?;
    println!(
        "batch {} dispatched with {} products",
        batch.batch_id, batch.expected_item_count
    );
    track(config, store, batch).await
}

/// Re-dispatch the failed items of `batch_id` and track the new batch.
///
/// # Errors
///
/// Returns an error if the original batch is unknown, a stored request no
/// longer decodes, or the new batch cannot be dispatched.
pub(crate) async fn run_retry_failed(
    pool: &sqlx::PgPool,
    config: &varsync_core::AppConfig,
    batch_id: Uuid,
) -> anyhow::Result<()> {
    let (dispatcher, store) = build_dispatcher(pool, config)?;
    let Some(batch) = dispatcher.retry_failed(batch_id).await? else {
        println!("batch {batch_id} has no failed items");
        return Ok(());
    };
    println!(
        "retrying {} failed products of {batch_id} as batch {}",
        batch.expected_item_count, batch.batch_id
    );
    track(config, store, batch).await
}

fn build_dispatcher(
    pool: &sqlx::PgPool,
    config: &varsync_core::AppConfig,
) -> anyhow::Result<(BatchDispatcher, Arc<PgStore>)> {
    let (orchestrator, store) = build_orchestrator(pool, config)?;
    let dispatcher = BatchDispatcher::new(orchestrator, store.clone(), config.batch_max_concurrent);
    Ok((dispatcher, store))
}

async fn track(
    config: &varsync_core::AppConfig,
    store: Arc<PgStore>,
    batch: DispatchedBatch,
) -> anyhow::Result<()> {
    let DispatchedBatch {
        batch_id,
        expected_item_count,
        worker,
    } = batch;

    let tracker = ProgressTracker::new(
        batch_id,
        expected_item_count,
        store,
        Arc::new(ConsoleObserver),
        TrackerConfig::from_config(config),
    );
    let handle = tracker.spawn();
    let cancel = handle.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let report = handle.wait().await?;
    interrupt.abort();

    if !worker.is_finished() {
        println!("waiting for in-flight syncs to finish (Ctrl-C again to abort)");
        tokio::select! {
            joined = worker => joined?,
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!(batch_id = %batch_id, "aborting batch with syncs in flight");
            }
        }
    }

    if let TrackerState::Completed(BatchOutcome::AllFailed { .. } | BatchOutcome::Mixed { .. }) =
        report.state
    {
        println!("re-run failures with: varsync retry-failed {batch_id}");
    }
    Ok(())
}

/// Prints progress lines to stdout.
struct ConsoleObserver;

impl ProgressObserver for ConsoleObserver {
    fn on_progress(&self, batch_id: Uuid, snapshot: &ProgressSnapshot) {
        println!("{}", progress_line(batch_id, snapshot));
    }

    fn on_finished(&self, batch_id: Uuid, report: &TrackerReport) {
        println!("{}", finished_line(batch_id, report));
    }
}

pub(crate) fn progress_line(batch_id: Uuid, snapshot: &ProgressSnapshot) -> String {
    format!(
        "[{batch_id}] {}/{} done ({} ok, {} failed)",
        snapshot.completed, snapshot.expected, snapshot.success, snapshot.failed
    )
}

pub(crate) fn finished_line(batch_id: Uuid, report: &TrackerReport) -> String {
    let summary = match report.state {
        TrackerState::Completed(BatchOutcome::AllSucceeded { success }) => {
            format!("completed: all {success} succeeded")
        }
        TrackerState::Completed(BatchOutcome::AllFailed { failed }) => {
            format!("completed: all {failed} failed")
        }
        TrackerState::Completed(BatchOutcome::Mixed { success, failed }) => {
            format!("completed: {success} succeeded, {failed} failed")
        }
        TrackerState::TimedOut => format!(
            "stopped tracking after {} polls with {}/{} done",
            report.polls, report.last.completed, report.last.expected
        ),
        TrackerState::Cancelled => "tracking cancelled".to_owned(),
    };
    format!("[{batch_id}] {summary}")
}
