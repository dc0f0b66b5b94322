use serde::{Deserialize, Serialize};

use crate::attributes::{Attribute, AttributeValue};
use crate::selection::VariantSelection;

/// One attribute and its selected values as sent to the external catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeLine {
    pub attribute: Attribute,
    /// Values in catalog `sequence` order.
    pub values: Vec<AttributeValue>,
}

impl AttributeLine {
    /// One line per selected attribute, in attribute display order.
    #[must_use]
    pub fn from_selection(selection: &VariantSelection) -> Vec<Self> {
        selection
            .groups()
            .iter()
            .map(|g| Self {
                attribute: g.attribute.clone(),
                values: g.values.clone(),
            })
            .collect()
    }
}

/// A parent product (template) on the external catalog.
///
/// With empty `attribute_lines` it stands alone as a simple product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    /// Unique business code; local upserts are keyed on it.
    pub code: String,
    pub name: String,
    /// Selling price in catalog minor units.
    pub base_price: i64,
    /// Purchase price in catalog minor units.
    pub purchase_price: i64,
    /// Source image reference (URL), if any.
    pub image: Option<String>,
    pub attribute_lines: Vec<AttributeLine>,
}

impl CatalogProduct {
    #[must_use]
    pub fn has_variants(&self) -> bool {
        !self.attribute_lines.is_empty()
    }
}

/// One concrete sellable variant of a [`CatalogProduct`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogVariant {
    /// Unique business code of the variant.
    pub code: String,
    pub parent_code: String,
    pub external_variant_id: i64,
    /// Name as chosen by the external catalog, e.g. `"AO01 (Trắng, S, 29)"`.
    pub name: String,
    /// Storage descriptor parsed from `name`, e.g. `"Trắng, S, 29"`.
    ///
    /// `None` when the catalog's name did not follow the expected
    /// `"<code> (<values>)"` convention.
    pub descriptor: Option<String>,
    /// Selling price in catalog minor units.
    pub price: i64,
    pub stock: i64,
}
