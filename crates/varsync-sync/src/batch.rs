//! Background batch dispatch.
//!
//! A batch persists one pending status row per product, then syncs the
//! products on a spawned task with bounded concurrency. The caller gets the
//! batch id back immediately and observes progress with a
//! [`crate::ProgressTracker`].

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;
use varsync_core::ItemStatus;
use varsync_db::NewSyncItem;

use crate::error::SyncError;
use crate::orchestrator::{SyncOrchestrator, SyncRequest};
use crate::ports::JobStore;

/// A batch whose worker is running in the background.
#[derive(Debug)]
pub struct DispatchedBatch {
    pub batch_id: Uuid,
    pub expected_item_count: usize,
    /// The worker task. Dropping the handle does not stop the worker.
    pub worker: JoinHandle<()>,
}

/// Dispatches batches of sync requests.
#[derive(Clone)]
pub struct BatchDispatcher {
    orchestrator: SyncOrchestrator,
    jobs: Arc<dyn JobStore>,
    max_concurrent: usize,
}

impl BatchDispatcher {
    pub fn new(
        orchestrator: SyncOrchestrator,
        jobs: Arc<dyn JobStore>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            orchestrator,
            jobs,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Records every request as a pending item and starts the worker.
    ///
    /// Returns as soon as the job rows exist.
    ///
    /// # Errors
    ///
    /// - [`SyncError::DuplicateBatchItem`] if two requests share a code.
    /// - [`SyncError::Request`] if a request cannot be encoded for storage.
    /// - [`SyncError::Job`] if the job rows cannot be written.
    pub async fn dispatch(&self, requests: Vec<SyncRequest>) -> Result<DispatchedBatch, SyncError> {
        let mut codes = HashSet::with_capacity(requests.len());
        for request in &requests {
            if !codes.insert(request.base_code.as_str()) {
                return Err(SyncError::DuplicateBatchItem(request.base_code.clone()));
            }
        }

        let items = requests
            .iter()
            .map(|request| -> Result<NewSyncItem, serde_json::Error> {
                Ok(NewSyncItem {
                    item_code: request.base_code.clone(),
                    request: serde_json::to_value(request)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let batch_id = self
            .jobs
            .create_job(&items)
            .await
            .map_err(|source| SyncError::Job {
                batch_id: None,
                source,
            })?;

        let expected_item_count = requests.len();
        info!(batch_id = %batch_id, items = expected_item_count, "batch dispatched");

        let worker = tokio::spawn(run_batch(
            self.orchestrator.clone(),
            Arc::clone(&self.jobs),
            batch_id,
            requests,
            self.max_concurrent,
        ));

        Ok(DispatchedBatch {
            batch_id,
            expected_item_count,
            worker,
        })
    }

    /// Re-dispatches only the failed items of `batch_id` as a new batch.
    ///
    /// Returns `None` when nothing failed.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Job`] if the failed items cannot be read or the new
    ///   job cannot be written.
    /// - [`SyncError::Request`] if a stored request no longer decodes.
    pub async fn retry_failed(&self, batch_id: Uuid) -> Result<Option<DispatchedBatch>, SyncError> {
        let stored = self
            .jobs
            .failed_requests(batch_id)
            .await
            .map_err(|source| SyncError::Job {
                batch_id: Some(batch_id),
                source,
            })?;

        if stored.is_empty() {
            info!(batch_id = %batch_id, "no failed items to retry");
            return Ok(None);
        }

        let requests = stored
            .into_iter()
            .map(serde_json::from_value::<SyncRequest>)
            .collect::<Result<Vec<_>, _>>()?;

        info!(batch_id = %batch_id, items = requests.len(), "retrying failed items");
        self.dispatch(requests).await.map(Some)
    }
}

async fn run_batch(
    orchestrator: SyncOrchestrator,
    jobs: Arc<dyn JobStore>,
    batch_id: Uuid,
    requests: Vec<SyncRequest>,
    max_concurrent: usize,
) {
    stream::iter(requests)
        .map(|request| {
            let orchestrator = orchestrator.clone();
            async move {
                let result = orchestrator.sync_product_variants(&request).await;
                (request.base_code, result)
            }
        })
        .buffer_unordered(max_concurrent)
        .for_each(|(code, result)| {
            let jobs = Arc::clone(&jobs);
            async move {
                let (status, detail) = match result {
                    Ok(_) => (ItemStatus::Success, None),
                    Err(e) => {
                        error!(batch_id = %batch_id, code = %code, error = %e, "batch item failed");
                        (ItemStatus::Failed, Some(e.to_string()))
                    }
                };
                if let Err(e) = jobs
                    .set_item_status(batch_id, &code, status, detail.as_deref())
                    .await
                {
                    error!(
                        batch_id = %batch_id,
                        code = %code,
                        error = %e,
                        "failed to record batch item status"
                    );
                }
            }
        })
        .await;

    info!(batch_id = %batch_id, "batch worker finished");
}
