//! Catalog sync orchestrator.
//!
//! One call syncs one logical product: resolve the selected attribute
//! values, expand them into combinations, build a single create request,
//! classify the catalog's answer, then reconcile the authoritative result
//! into the local store.
//!
//! Ordering guarantees:
//! - The create request is sent only after every local read succeeded.
//! - Local writes happen only after the catalog answered with success or
//!   "already exists", and always happen in that case.

mod reconcile;

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use varsync_catalog::{CreateOutcome, ProductPayload};
use varsync_core::{
    generate_combinations, try_normalize_price, AttributeLine, CatalogProduct, PriceInput,
    VariantSelection, DEFAULT_PRICE_SCALE,
};

use crate::error::SyncError;
use crate::ports::{AttributeCatalog, CatalogGateway, ProductStore};

/// Input of one sync call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    /// Parent product code; local upserts are keyed on it.
    pub base_code: String,
    pub name: String,
    #[serde(default)]
    pub purchase_price: PriceInput,
    #[serde(default)]
    pub selling_price: PriceInput,
    /// Source image URL, fetched once per call.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Selected attribute value ids. Empty means a simple product.
    #[serde(default)]
    pub selected_value_ids: Vec<i64>,
}

/// Successful outcome of one sync call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub code: String,
    /// The catalog reported the code as already existing.
    pub already_exists: bool,
    /// Local id of the parent row.
    pub parent_id: i64,
    /// Catalog id of the parent, when the catalog returned one.
    pub external_id: Option<i64>,
    /// Number of child rows reconciled into the local store.
    pub variant_count: usize,
    /// Catalog variant names that did not end in a value list. Their
    /// children were stored without a descriptor.
    pub unparseable_variants: Vec<String>,
    /// Planned storage descriptors with no equivalent child in the
    /// catalog's answer.
    pub missing_variants: Vec<String>,
}

/// Flat result shape for callers that render a single record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    pub already_exists: bool,
    pub parent_id: Option<i64>,
    pub external_id: Option<i64>,
    pub variant_count: usize,
    pub error_detail: Option<String>,
    /// Set when the catalog holds state the local store does not.
    pub reconciliation_required: bool,
    /// Catalog variant ids to reconcile by hand.
    pub variant_external_ids: Vec<i64>,
}

impl From<Result<SyncReport, SyncError>> for SyncResult {
    fn from(result: Result<SyncReport, SyncError>) -> Self {
        match result {
            Ok(report) => Self {
                success: true,
                already_exists: report.already_exists,
                parent_id: Some(report.parent_id),
                external_id: report.external_id,
                variant_count: report.variant_count,
                ..Self::default()
            },
            Err(err) => {
                let error_detail = Some(err.to_string());
                match err {
                    SyncError::Reconciliation {
                        parent_external_id,
                        variant_external_ids,
                        ..
                    } => Self {
                        external_id: parent_external_id,
                        reconciliation_required: true,
                        variant_external_ids,
                        error_detail,
                        ..Self::default()
                    },
                    _ => Self {
                        error_detail,
                        ..Self::default()
                    },
                }
            }
        }
    }
}

/// Drives one product through the catalog and into local storage.
///
/// Cheap to clone; all collaborators are shared. Holds no mutable state,
/// so concurrent calls for different codes are independent. Concurrent
/// calls for the same code are not serialized here.
#[derive(Clone)]
pub struct SyncOrchestrator {
    attributes: Arc<dyn AttributeCatalog>,
    catalog: Arc<dyn CatalogGateway>,
    store: Arc<dyn ProductStore>,
    price_scale: i64,
}

impl SyncOrchestrator {
    pub fn new(
        attributes: Arc<dyn AttributeCatalog>,
        catalog: Arc<dyn CatalogGateway>,
        store: Arc<dyn ProductStore>,
    ) -> Self {
        Self {
            attributes,
            catalog,
            store,
            price_scale: DEFAULT_PRICE_SCALE,
        }
    }

    /// Overrides the minor-unit multiplier (default 1000).
    #[must_use]
    pub fn with_price_scale(mut self, price_scale: i64) -> Self {
        self.price_scale = price_scale;
        self
    }

    /// Syncs one product and its full variant set.
    ///
    /// Safe to re-run with identical input: a duplicate answer from the
    /// catalog is a success with `already_exists` set, and every local write
    /// is an upsert keyed by code.
    ///
    /// # Errors
    ///
    /// - [`SyncError::ReferenceDataMissing`],
    ///   [`SyncError::ReferenceAttributesMissing`], [`SyncError::ReferenceLookup`],
    ///   [`SyncError::InvalidSelection`], [`SyncError::Image`]: nothing was
    ///   sent and nothing was written.
    /// - [`SyncError::ExternalCall`]: the catalog refused or was unreachable;
    ///   nothing was written and the call is safe to retry.
    /// - [`SyncError::Reconciliation`]: the catalog accepted the product but
    ///   the local write failed.
    pub async fn sync_product_variants(
        &self,
        request: &SyncRequest,
    ) -> Result<SyncReport, SyncError> {
        let code = request.base_code.as_str();

        let selection = self.resolve_selection(&request.selected_value_ids).await?;
        let combinations = generate_combinations(&selection);

        let product = CatalogProduct {
            code: code.to_owned(),
            name: request.name.clone(),
            base_price: self.price_or_zero(code, "selling_price", &request.selling_price),
            purchase_price: self.price_or_zero(code, "purchase_price", &request.purchase_price),
            image: request.image_url.clone(),
            attribute_lines: AttributeLine::from_selection(&selection),
        };

        let image = match &request.image_url {
            Some(url) => Some(
                self.catalog
                    .fetch_image(url)
                    .await
                    .map_err(SyncError::Image)?
                    .base64,
            ),
            None => None,
        };

        let payload = ProductPayload::build(&product, &combinations, image);
        info!(
            code,
            variants = payload.product_variants.len(),
            simple = payload.is_simple(),
            "dispatching product to catalog"
        );

        let outcome = self
            .catalog
            .create_product(&payload)
            .await
            .map_err(SyncError::ExternalCall)?;

        match outcome {
            CreateOutcome::Created(created) => {
                info!(code, external_id = created.id, "catalog created product");
                self.reconcile(&product, &combinations, &created, false)
                    .await
            }
            CreateOutcome::AlreadyExists { status, .. } => {
                info!(code, status, "catalog reports product already exists");
                self.reconcile_existing(&product, &combinations).await
            }
        }
    }

    /// Resolves the selected ids into a [`VariantSelection`].
    ///
    /// Repeated ids are collapsed. Any id that resolves to nothing fails the
    /// whole call, so a partial selection never yields a smaller variant set.
    ///
    /// # Errors
    ///
    /// [`SyncError::ReferenceDataMissing`] or
    /// [`SyncError::ReferenceAttributesMissing`] when an id resolves to no
    /// row, [`SyncError::ReferenceLookup`] or [`SyncError::InvalidSelection`].
    pub async fn resolve_selection(
        &self,
        value_ids: &[i64],
    ) -> Result<VariantSelection, SyncError> {
        let ids: Vec<i64> = value_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if ids.is_empty() {
            return Ok(VariantSelection::default());
        }

        let values = self
            .attributes
            .list_attribute_values(&ids)
            .await
            .map_err(SyncError::ReferenceLookup)?;

        let found: BTreeSet<i64> = values.iter().map(|v| v.id).collect();
        let missing_ids: Vec<i64> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
        if !missing_ids.is_empty() {
            return Err(SyncError::ReferenceDataMissing { missing_ids });
        }

        let attribute_ids: Vec<i64> = values
            .iter()
            .map(|v| v.attribute_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let attributes = self
            .attributes
            .list_attributes(&attribute_ids)
            .await
            .map_err(SyncError::ReferenceLookup)?;

        let known: BTreeSet<i64> = attributes.iter().map(|a| a.id).collect();
        let missing_attribute_ids: Vec<i64> = attribute_ids
            .iter()
            .copied()
            .filter(|id| !known.contains(id))
            .collect();
        if !missing_attribute_ids.is_empty() {
            return Err(SyncError::ReferenceAttributesMissing {
                missing_attribute_ids,
            });
        }

        Ok(VariantSelection::from_catalog(&attributes, &values)?)
    }

    fn price_or_zero(&self, code: &str, field: &'static str, input: &PriceInput) -> i64 {
        try_normalize_price(input, self.price_scale).unwrap_or_else(|| {
            warn!(code, field, input = ?input, "unparseable price, using 0");
            0
        })
    }
}
