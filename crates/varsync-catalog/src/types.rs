//! Response types returned by the external catalog.
//!
//! The catalog speaks PascalCase JSON. A successful create returns the full
//! product graph with catalog-assigned ids and catalog-chosen variant names;
//! those names are authoritative and are what local reconciliation parses.
//!
//! `ListPrice`, `PurchasePrice` and `QtyAvailable` default to zero when the
//! catalog omits them. An omitted `PriceVariant` stays `None` so callers can
//! fall back to the parent's price.

use serde::{Deserialize, Serialize};

/// A product as the catalog stored it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreatedProduct {
    /// Catalog-assigned product template id.
    pub id: i64,
    pub default_code: String,
    pub name: String,
    #[serde(default)]
    pub list_price: i64,
    #[serde(default)]
    pub purchase_price: i64,
    #[serde(default)]
    pub product_variants: Vec<CreatedVariant>,
}

impl CreatedProduct {
    /// Catalog ids of every returned variant, for reconciliation reports.
    #[must_use]
    pub fn variant_ids(&self) -> Vec<i64> {
        self.product_variants.iter().map(|v| v.id).collect()
    }
}

/// A variant as the catalog stored it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreatedVariant {
    pub id: i64,
    pub default_code: String,
    /// Catalog display name, e.g. `"AO01 (Trắng, S, 29)"`.
    pub name_get: String,
    #[serde(default)]
    pub price_variant: Option<i64>,
    #[serde(default)]
    pub qty_available: i64,
}
