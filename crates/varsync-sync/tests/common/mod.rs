//! In-memory fakes of the sync ports, shared by the integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;
use varsync_catalog::{
    CatalogError, CreateOutcome, CreatedProduct, CreatedVariant, EncodedImage, ProductPayload,
};
use varsync_core::{
    Attribute, AttributeValue, CatalogProduct, CatalogVariant, ItemStatus, ProgressSnapshot,
    SyncItem, TrackerReport,
};
use varsync_db::{DbError, NewSyncItem};
use varsync_sync::{
    AttributeCatalog, CatalogGateway, JobStore, ProductStore, ProgressObserver, StatusSource,
    SyncOrchestrator, SyncRequest,
};

// ---------------------------------------------------------------------------
// Attribute catalog
// ---------------------------------------------------------------------------

pub struct FakeAttributes {
    pub attributes: Vec<Attribute>,
    pub values: Vec<AttributeValue>,
}

impl FakeAttributes {
    /// Size (display order 1): S, M. Color (display order 2): Red, Blue.
    pub fn size_color() -> Self {
        let attribute = |id, name: &str, display_order| Attribute {
            id,
            name: name.to_string(),
            display_order,
        };
        let value = |id, attribute_id, value: &str, external_id, sequence| AttributeValue {
            id,
            attribute_id,
            value: value.to_string(),
            external_id,
            sequence,
        };
        Self {
            attributes: vec![attribute(2, "Color", 2), attribute(1, "Size", 1)],
            values: vec![
                value(12, 1, "M", 502, 2),
                value(11, 1, "S", 501, 1),
                value(21, 2, "Red", 601, 1),
                value(22, 2, "Blue", 602, 2),
            ],
        }
    }
}

#[async_trait]
impl AttributeCatalog for FakeAttributes {
    async fn list_attribute_values(&self, ids: &[i64]) -> Result<Vec<AttributeValue>, DbError> {
        Ok(self
            .values
            .iter()
            .filter(|v| ids.contains(&v.id))
            .cloned()
            .collect())
    }

    async fn list_attributes(&self, ids: &[i64]) -> Result<Vec<Attribute>, DbError> {
        let mut found: Vec<Attribute> = self
            .attributes
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.display_order, a.id));
        Ok(found)
    }
}

// ---------------------------------------------------------------------------
// External catalog
// ---------------------------------------------------------------------------

/// Behaves like the real catalog: the first create for a code succeeds and
/// names variants after the payload; later creates answer "already exists".
/// Scripted responses, when queued, take precedence.
#[derive(Default)]
pub struct FakeCatalog {
    pub payloads: Mutex<Vec<ProductPayload>>,
    pub scripted: Mutex<VecDeque<Result<CreateOutcome, CatalogError>>>,
    pub products: Mutex<HashMap<String, CreatedProduct>>,
    pub lookup_disabled: AtomicBool,
    pub image_calls: AtomicUsize,
    pub image_fails: AtomicBool,
    next_id: AtomicI64,
}

impl FakeCatalog {
    pub fn script(&self, response: Result<CreateOutcome, CatalogError>) {
        self.scripted.lock().unwrap().push_back(response);
    }

    pub fn create_calls(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    pub fn last_payload(&self) -> ProductPayload {
        self.payloads
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no payload sent")
    }
}

#[async_trait]
impl CatalogGateway for FakeCatalog {
    async fn create_product(
        &self,
        payload: &ProductPayload,
    ) -> Result<CreateOutcome, CatalogError> {
        self.payloads.lock().unwrap().push(payload.clone());
        if let Some(response) = self.scripted.lock().unwrap().pop_front() {
            return response;
        }

        let mut products = self.products.lock().unwrap();
        if products.contains_key(&payload.default_code) {
            return Ok(CreateOutcome::AlreadyExists {
                status: 400,
                body: format!("Mã sản phẩm {} đã tồn tại", payload.default_code),
            });
        }

        let id = 9000 + self.next_id.fetch_add(1, Ordering::SeqCst);
        let created = CreatedProduct {
            id,
            default_code: payload.default_code.clone(),
            name: payload.name.clone(),
            list_price: payload.list_price,
            purchase_price: payload.purchase_price,
            product_variants: payload
                .product_variants
                .iter()
                .zip(1..)
                .map(|(v, n)| CreatedVariant {
                    id: id * 100 + n,
                    default_code: format!("{}-{n}", payload.default_code),
                    name_get: v.name.clone(),
                    price_variant: Some(v.list_price),
                    qty_available: 0,
                })
                .collect(),
        };
        products.insert(payload.default_code.clone(), created.clone());
        Ok(CreateOutcome::Created(created))
    }

    async fn find_product_by_code(
        &self,
        code: &str,
    ) -> Result<Option<CreatedProduct>, CatalogError> {
        if self.lookup_disabled.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.products.lock().unwrap().get(code).cloned())
    }

    async fn fetch_image(&self, url: &str) -> Result<EncodedImage, CatalogError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        if self.image_fails.load(Ordering::SeqCst) {
            return Err(CatalogError::ImageFetch {
                url: url.to_string(),
                status: 404,
            });
        }
        Ok(EncodedImage {
            source_url: url.to_string(),
            content_type: Some("image/png".to_string()),
            byte_len: 5,
            base64: "aGVsbG8=".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Product store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StoredProduct {
    pub id: i64,
    pub product: CatalogProduct,
    pub external_id: Option<i64>,
}

/// Upsert-by-code store backed by maps.
#[derive(Default)]
pub struct MemoryStore {
    pub products: Mutex<BTreeMap<String, StoredProduct>>,
    pub variants: Mutex<BTreeMap<String, CatalogVariant>>,
    pub fail_variant_writes: AtomicBool,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn product_count(&self) -> usize {
        self.products.lock().unwrap().len()
    }

    pub fn product(&self, code: &str) -> Option<StoredProduct> {
        self.products.lock().unwrap().get(code).cloned()
    }

    pub fn variants_of(&self, parent: &str) -> Vec<CatalogVariant> {
        self.variants
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.parent_code == parent)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn upsert_product(
        &self,
        product: &CatalogProduct,
        external_id: Option<i64>,
    ) -> Result<i64, DbError> {
        let mut products = self.products.lock().unwrap();
        if let Some(existing) = products.get_mut(&product.code) {
            existing.product = product.clone();
            existing.external_id = external_id.or(existing.external_id);
            return Ok(existing.id);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        products.insert(
            product.code.clone(),
            StoredProduct {
                id,
                product: product.clone(),
                external_id,
            },
        );
        Ok(id)
    }

    async fn upsert_variants(&self, variants: &[CatalogVariant]) -> Result<u64, DbError> {
        if self.fail_variant_writes.load(Ordering::SeqCst) {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        let mut stored = self.variants.lock().unwrap();
        for variant in variants {
            stored.insert(variant.code.clone(), variant.clone());
        }
        Ok(variants.len() as u64)
    }
}

// ---------------------------------------------------------------------------
// Jobs and status polling
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct JobItem {
    pub code: String,
    pub status: ItemStatus,
    pub error_detail: Option<String>,
    pub request: serde_json::Value,
}

#[derive(Default)]
pub struct MemoryJobs {
    pub jobs: Mutex<HashMap<Uuid, Vec<JobItem>>>,
}

impl MemoryJobs {
    pub fn items(&self, batch_id: Uuid) -> Vec<JobItem> {
        self.jobs
            .lock()
            .unwrap()
            .get(&batch_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl JobStore for MemoryJobs {
    async fn create_job(&self, items: &[NewSyncItem]) -> Result<Uuid, DbError> {
        let batch_id = Uuid::new_v4();
        let rows = items
            .iter()
            .map(|i| JobItem {
                code: i.item_code.clone(),
                status: ItemStatus::Pending,
                error_detail: None,
                request: i.request.clone(),
            })
            .collect();
        self.jobs.lock().unwrap().insert(batch_id, rows);
        Ok(batch_id)
    }

    async fn set_item_status(
        &self,
        batch_id: Uuid,
        item_code: &str,
        status: ItemStatus,
        error_detail: Option<&str>,
    ) -> Result<(), DbError> {
        let mut jobs = self.jobs.lock().unwrap();
        let item = jobs
            .get_mut(&batch_id)
            .and_then(|items| items.iter_mut().find(|i| i.code == item_code))
            .ok_or(DbError::NotFound)?;
        item.status = status;
        item.error_detail = error_detail.map(str::to_string);
        Ok(())
    }

    async fn failed_requests(&self, batch_id: Uuid) -> Result<Vec<serde_json::Value>, DbError> {
        let jobs = self.jobs.lock().unwrap();
        let items = jobs.get(&batch_id).ok_or(DbError::JobNotFound(batch_id))?;
        Ok(items
            .iter()
            .filter(|i| i.status == ItemStatus::Failed)
            .map(|i| i.request.clone())
            .collect())
    }
}

#[async_trait]
impl StatusSource for MemoryJobs {
    async fn item_statuses(&self, batch_id: Uuid) -> Result<Vec<SyncItem>, DbError> {
        Ok(self
            .items(batch_id)
            .into_iter()
            .map(|i| SyncItem {
                item_id: i.code,
                status: i.status,
                error_detail: i.error_detail,
            })
            .collect())
    }
}

/// Status source that replays a fixed sequence of poll results. Once the
/// sequence is exhausted it keeps returning the last entry.
pub struct ScriptedStatus {
    polls: Mutex<VecDeque<Result<Vec<SyncItem>, ()>>>,
    last: Mutex<Option<Result<Vec<SyncItem>, ()>>>,
    pub calls: AtomicUsize,
}

impl ScriptedStatus {
    pub fn new(polls: Vec<Result<Vec<SyncItem>, ()>>) -> Self {
        Self {
            polls: Mutex::new(polls.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusSource for ScriptedStatus {
    async fn item_statuses(&self, _batch_id: Uuid) -> Result<Vec<SyncItem>, DbError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.polls.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(next) = next {
            *last = Some(next);
        }
        match last.clone() {
            Some(Ok(items)) => Ok(items),
            Some(Err(())) => Err(DbError::Sqlx(sqlx::Error::PoolTimedOut)),
            None => Ok(Vec::new()),
        }
    }
}

/// Builds `count` items with the given status, codes prefixed by `prefix`.
pub fn items(prefix: &str, count: usize, status: ItemStatus) -> Vec<SyncItem> {
    (0..count)
        .map(|n| SyncItem {
            item_id: format!("{prefix}{n}"),
            status,
            error_detail: None,
        })
        .collect()
}

#[derive(Default)]
pub struct RecordingObserver {
    pub progress: Mutex<Vec<ProgressSnapshot>>,
    pub finished: Mutex<Vec<TrackerReport>>,
}

impl RecordingObserver {
    pub fn progress_count(&self) -> usize {
        self.progress.lock().unwrap().len()
    }

    pub fn finished(&self) -> Vec<TrackerReport> {
        self.finished.lock().unwrap().clone()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_progress(&self, _batch_id: Uuid, snapshot: &ProgressSnapshot) {
        self.progress.lock().unwrap().push(*snapshot);
    }

    fn on_finished(&self, _batch_id: Uuid, report: &TrackerReport) {
        self.finished.lock().unwrap().push(*report);
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub struct Harness {
    pub catalog: Arc<FakeCatalog>,
    pub store: Arc<MemoryStore>,
    pub orchestrator: SyncOrchestrator,
}

pub fn harness() -> Harness {
    let catalog = Arc::new(FakeCatalog::default());
    let store = Arc::new(MemoryStore::default());
    let orchestrator = SyncOrchestrator::new(
        Arc::new(FakeAttributes::size_color()),
        catalog.clone(),
        store.clone(),
    );
    Harness {
        catalog,
        store,
        orchestrator,
    }
}

pub fn request(code: &str, selected_value_ids: Vec<i64>) -> SyncRequest {
    SyncRequest {
        base_code: code.to_string(),
        name: "Áo thun".to_string(),
        purchase_price: 90.0.into(),
        selling_price: "150".into(),
        image_url: None,
        selected_value_ids,
    }
}
