use thiserror::Error;
use uuid::Uuid;
use varsync_catalog::CatalogError;
use varsync_core::CoreError;
use varsync_db::DbError;

/// Failure of a sync call or a batch dispatch.
///
/// A duplicate create is not an error; it is reported through
/// `SyncReport::already_exists`.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("attribute values not found: {missing_ids:?}")]
    ReferenceDataMissing { missing_ids: Vec<i64> },

    /// Selected values point at attribute rows that do not exist.
    #[error("attributes not found: {missing_attribute_ids:?}")]
    ReferenceAttributesMissing { missing_attribute_ids: Vec<i64> },

    #[error("attribute catalog lookup failed: {0}")]
    ReferenceLookup(#[source] DbError),

    #[error("invalid selection: {0}")]
    InvalidSelection(#[from] CoreError),

    #[error("image preparation failed: {0}")]
    Image(#[source] CatalogError),

    #[error("external catalog call failed: {0}")]
    ExternalCall(#[source] CatalogError),

    /// The catalog holds state the local store does not. Re-running a plain
    /// create will not fix it; the ids identify what to reconcile.
    #[error(
        "catalog accepted product (external id {parent_external_id:?}) but the local write failed: {source}"
    )]
    Reconciliation {
        parent_external_id: Option<i64>,
        variant_external_ids: Vec<i64>,
        #[source]
        source: DbError,
    },

    #[error("product code {0} appears more than once in the batch")]
    DuplicateBatchItem(String),

    #[error("sync job store failed: {source}")]
    Job {
        /// `None` when the job row itself could not be created.
        batch_id: Option<Uuid>,
        #[source]
        source: DbError,
    },

    #[error("stored sync request could not be encoded or decoded: {0}")]
    Request(#[from] serde_json::Error),
}

impl SyncError {
    /// `true` for failures detected before any external call was made.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ReferenceDataMissing { .. }
                | Self::ReferenceAttributesMissing { .. }
                | Self::ReferenceLookup(_)
                | Self::InvalidSelection(_)
                | Self::Image(_)
        )
    }

    /// `true` when the catalog and the local store now disagree.
    #[must_use]
    pub fn requires_reconciliation(&self) -> bool {
        matches!(self, Self::Reconciliation { .. })
    }
}
