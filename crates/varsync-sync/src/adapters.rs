//! Production implementations of the [`crate::ports`] traits.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use varsync_catalog::{
    CatalogClient, CatalogError, CreateOutcome, CreatedProduct, EncodedImage, ProductPayload,
};
use varsync_core::{
    Attribute, AttributeValue, CatalogProduct, CatalogVariant, ItemStatus, SyncItem,
};
use varsync_db::{DbError, NewSyncItem};

use crate::ports::{AttributeCatalog, CatalogGateway, JobStore, ProductStore, StatusSource};

#[async_trait]
impl CatalogGateway for CatalogClient {
    async fn create_product(
        &self,
        payload: &ProductPayload,
    ) -> Result<CreateOutcome, CatalogError> {
        CatalogClient::create_product(self, payload).await
    }

    async fn find_product_by_code(
        &self,
        code: &str,
    ) -> Result<Option<CreatedProduct>, CatalogError> {
        CatalogClient::find_product_by_code(self, code).await
    }

    async fn fetch_image(&self, url: &str) -> Result<EncodedImage, CatalogError> {
        CatalogClient::fetch_image(self, url).await
    }
}

/// Postgres-backed store implementing every storage port.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AttributeCatalog for PgStore {
    async fn list_attribute_values(&self, ids: &[i64]) -> Result<Vec<AttributeValue>, DbError> {
        varsync_db::list_attribute_values(&self.pool, ids).await
    }

    async fn list_attributes(&self, ids: &[i64]) -> Result<Vec<Attribute>, DbError> {
        varsync_db::list_attributes(&self.pool, ids).await
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn upsert_product(
        &self,
        product: &CatalogProduct,
        external_id: Option<i64>,
    ) -> Result<i64, DbError> {
        varsync_db::upsert_product(&self.pool, product, external_id).await
    }

    async fn upsert_variants(&self, variants: &[CatalogVariant]) -> Result<u64, DbError> {
        varsync_db::upsert_variants(&self.pool, variants).await
    }
}

#[async_trait]
impl StatusSource for PgStore {
    async fn item_statuses(&self, batch_id: Uuid) -> Result<Vec<SyncItem>, DbError> {
        varsync_db::list_item_statuses(&self.pool, batch_id).await
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn create_job(&self, items: &[NewSyncItem]) -> Result<Uuid, DbError> {
        let job = varsync_db::create_sync_job(&self.pool, items).await?;
        Ok(job.public_id)
    }

    async fn set_item_status(
        &self,
        batch_id: Uuid,
        item_code: &str,
        status: ItemStatus,
        error_detail: Option<&str>,
    ) -> Result<(), DbError> {
        varsync_db::set_item_status(&self.pool, batch_id, item_code, status, error_detail).await
    }

    async fn failed_requests(&self, batch_id: Uuid) -> Result<Vec<serde_json::Value>, DbError> {
        // An unknown batch is JobNotFound, not an empty list.
        varsync_db::get_sync_job(&self.pool, batch_id).await?;
        let rows = varsync_db::list_failed_items(&self.pool, batch_id).await?;
        Ok(rows.into_iter().map(|row| row.request).collect())
    }
}
