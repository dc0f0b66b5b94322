//! Batch job and progress types shared by the dispatcher and the tracker.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Per-item processing status as written by the batch worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Success,
    Failed,
}

impl ItemStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// `true` once the item reached success or failure.
    #[must_use]
    pub fn is_resolved(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::InvalidItemStatus(other.to_owned())),
        }
    }
}

/// Status row for one item of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncItem {
    /// Product code the item syncs.
    pub item_id: String,
    pub status: ItemStatus,
    pub error_detail: Option<String>,
}

/// Intermediate progress reported on every poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub expected: usize,
    pub success: usize,
    pub failed: usize,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn from_items(expected: usize, items: &[SyncItem]) -> Self {
        let success = items
            .iter()
            .filter(|i| i.status == ItemStatus::Success)
            .count();
        let failed = items
            .iter()
            .filter(|i| i.status == ItemStatus::Failed)
            .count();
        Self {
            completed: success + failed,
            expected,
            success,
            failed,
        }
    }

    /// Uses `>=` so late duplicate status rows cannot stall completion.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed >= self.expected
    }
}

/// How a completed batch turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchOutcome {
    AllSucceeded { success: usize },
    AllFailed { failed: usize },
    Mixed { success: usize, failed: usize },
}

impl BatchOutcome {
    /// An empty batch counts as all-succeeded.
    #[must_use]
    pub fn classify(success: usize, failed: usize) -> Self {
        match (success, failed) {
            (_, 0) => Self::AllSucceeded { success },
            (0, _) => Self::AllFailed { failed },
            _ => Self::Mixed { success, failed },
        }
    }
}

/// State of a progress tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrackerState {
    Completed(BatchOutcome),
    TimedOut,
    Cancelled,
}

/// Terminal report of one tracker run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerReport {
    pub state: TrackerState,
    /// Number of status polls actually issued.
    pub polls: u32,
    /// Last snapshot observed, default if no poll succeeded.
    pub last: ProgressSnapshot,
}
