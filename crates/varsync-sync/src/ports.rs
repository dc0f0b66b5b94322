//! Trait seams between the sync logic and its collaborators.
//!
//! Each trait is the narrowest interface one component needs. Production
//! implementations live in [`crate::adapters`]; tests substitute in-memory
//! fakes.

use async_trait::async_trait;
use uuid::Uuid;
use varsync_catalog::{CatalogError, CreateOutcome, CreatedProduct, EncodedImage, ProductPayload};
use varsync_core::{
    Attribute, AttributeValue, CatalogProduct, CatalogVariant, ItemStatus, ProgressSnapshot,
    SyncItem, TrackerReport,
};
use varsync_db::{DbError, NewSyncItem};

/// Read-only access to attribute reference data.
#[async_trait]
pub trait AttributeCatalog: Send + Sync {
    /// Values with the given ids. Unknown ids are absent, not errors.
    async fn list_attribute_values(&self, ids: &[i64]) -> Result<Vec<AttributeValue>, DbError>;

    /// Attributes with the given ids, ordered by display order.
    async fn list_attributes(&self, ids: &[i64]) -> Result<Vec<Attribute>, DbError>;
}

/// The external catalog's write interface.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn create_product(&self, payload: &ProductPayload)
        -> Result<CreateOutcome, CatalogError>;

    async fn find_product_by_code(&self, code: &str)
        -> Result<Option<CreatedProduct>, CatalogError>;

    async fn fetch_image(&self, url: &str) -> Result<EncodedImage, CatalogError>;
}

/// Local product storage with upsert-by-code semantics.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Returns the local id of the parent row.
    async fn upsert_product(
        &self,
        product: &CatalogProduct,
        external_id: Option<i64>,
    ) -> Result<i64, DbError>;

    /// Returns the number of rows written.
    async fn upsert_variants(&self, variants: &[CatalogVariant]) -> Result<u64, DbError>;
}

/// Per-item status rows of a batch, as polled by the tracker.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn item_statuses(&self, batch_id: Uuid) -> Result<Vec<SyncItem>, DbError>;
}

/// Persistence for batch jobs, written by the batch worker.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Creates the job with every item pending and returns its batch id.
    async fn create_job(&self, items: &[NewSyncItem]) -> Result<Uuid, DbError>;

    async fn set_item_status(
        &self,
        batch_id: Uuid,
        item_code: &str,
        status: ItemStatus,
        error_detail: Option<&str>,
    ) -> Result<(), DbError>;

    /// Stored requests of the items that failed.
    async fn failed_requests(&self, batch_id: Uuid) -> Result<Vec<serde_json::Value>, DbError>;
}

/// Receives tracker progress. Implementations must not block.
pub trait ProgressObserver: Send + Sync {
    /// Called after every non-terminal poll.
    fn on_progress(&self, batch_id: Uuid, snapshot: &ProgressSnapshot);

    /// Called exactly once per tracker run with the terminal state.
    fn on_finished(&self, batch_id: Uuid, report: &TrackerReport);
}
