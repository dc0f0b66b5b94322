//! Writes the catalog's authoritative answer into the local store.

use tracing::{debug, error, warn};
use varsync_catalog::{extract_variant_descriptor, CreatedProduct, CreatedVariant};
use varsync_core::{find_matching_variant, CatalogProduct, CatalogVariant, VariantCombination};
use varsync_db::DbError;

use super::{SyncOrchestrator, SyncReport};
use crate::error::SyncError;

impl SyncOrchestrator {
    /// Upserts the parent, then batch-upserts every returned child.
    ///
    /// A simple product stores the parent only; any default variant the
    /// catalog returns for it is ignored. Child descriptors come from the catalog's own variant names, not from
    /// `combinations`; the planned combinations are only used to report
    /// which variants the catalog did not return.
    pub(super) async fn reconcile(
        &self,
        product: &CatalogProduct,
        combinations: &[VariantCombination],
        created: &CreatedProduct,
        already_exists: bool,
    ) -> Result<SyncReport, SyncError> {
        let failed = |source: DbError| {
            error!(
                code = %product.code,
                external_id = created.id,
                error = %source,
                "catalog has the product but the local write failed"
            );
            SyncError::Reconciliation {
                parent_external_id: Some(created.id),
                variant_external_ids: created.variant_ids(),
                source,
            }
        };

        let parent_id = self
            .store
            .upsert_product(product, Some(created.id))
            .await
            .map_err(&failed)?;

        let returned: &[CreatedVariant] = if product.has_variants() {
            created.product_variants.as_slice()
        } else {
            if !created.product_variants.is_empty() {
                debug!(
                    code = %product.code,
                    returned = created.product_variants.len(),
                    "simple product; not storing catalog default variants"
                );
            }
            &[]
        };

        let mut unparseable_variants = Vec::new();
        let variants: Vec<CatalogVariant> = returned
            .iter()
            .map(|v| {
                let descriptor = extract_variant_descriptor(&v.name_get);
                if descriptor.is_none() {
                    warn!(
                        code = %product.code,
                        variant = %v.default_code,
                        name = %v.name_get,
                        "catalog variant name has no value list; storing without descriptor"
                    );
                    unparseable_variants.push(v.name_get.clone());
                }
                CatalogVariant {
                    code: v.default_code.clone(),
                    parent_code: product.code.clone(),
                    external_variant_id: v.id,
                    name: v.name_get.clone(),
                    descriptor,
                    price: v.price_variant.unwrap_or(product.base_price),
                    stock: v.qty_available,
                }
            })
            .collect();

        if !variants.is_empty() {
            self.store
                .upsert_variants(&variants)
                .await
                .map_err(&failed)?;
        }

        let missing_variants: Vec<String> = combinations
            .iter()
            .map(VariantCombination::storage_descriptor)
            .filter(|planned| find_matching_variant(planned, &variants).is_none())
            .collect();
        if !missing_variants.is_empty() {
            warn!(
                code = %product.code,
                missing = missing_variants.len(),
                "catalog returned fewer variants than planned"
            );
        }

        Ok(SyncReport {
            code: product.code.clone(),
            already_exists,
            parent_id,
            external_id: Some(created.id),
            variant_count: variants.len(),
            unparseable_variants,
            missing_variants,
        })
    }

    /// Handles an "already exists" answer.
    ///
    /// Reconciles the catalog's existing product when the follow-up lookup
    /// finds it. Otherwise records the parent from request data, so exactly
    /// one parent row exists for the code either way.
    pub(super) async fn reconcile_existing(
        &self,
        product: &CatalogProduct,
        combinations: &[VariantCombination],
    ) -> Result<SyncReport, SyncError> {
        match self.catalog.find_product_by_code(&product.code).await {
            Ok(Some(existing)) => {
                return self
                    .reconcile(product, combinations, &existing, true)
                    .await;
            }
            Ok(None) => {
                warn!(code = %product.code, "duplicate product not found by code lookup");
            }
            Err(e) => {
                warn!(code = %product.code, error = %e, "duplicate product lookup failed");
            }
        }

        let parent_id = self
            .store
            .upsert_product(product, None)
            .await
            .map_err(|source| SyncError::Reconciliation {
                parent_external_id: None,
                variant_external_ids: Vec::new(),
                source,
            })?;

        Ok(SyncReport {
            code: product.code.clone(),
            already_exists: true,
            parent_id,
            external_id: None,
            variant_count: 0,
            unparseable_variants: Vec::new(),
            missing_variants: Vec::new(),
        })
    }
}
