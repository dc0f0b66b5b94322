//! Create/update request body for the catalog's product endpoint.
//!
//! One request carries the parent and every variant row. A simple product
//! is the same shape with empty `AttributeLines` and `ProductVariants`.

use serde::Serialize;
use sha2::{Digest, Sha256};
use varsync_core::{AttributeLine, CatalogProduct, VariantCombination};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductPayload {
    pub default_code: String,
    pub name: String,
    pub list_price: i64,
    pub purchase_price: i64,
    /// Base64-encoded image bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub attribute_lines: Vec<AttributeLinePayload>,
    pub product_variants: Vec<VariantPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeLinePayload {
    pub attribute_id: i64,
    pub attribute_name: String,
    pub values: Vec<AttributeValuePayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeValuePayload {
    /// External catalog id of the value.
    pub id: i64,
    pub name: String,
    pub sequence: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VariantPayload {
    /// Display name, values in reverse attribute order.
    pub name: String,
    /// Storage descriptor, values in attribute order.
    pub variant_description: String,
    pub list_price: i64,
    pub purchase_price: i64,
    /// External value ids, in attribute order.
    pub attribute_value_ids: Vec<i64>,
}

impl ProductPayload {
    /// Builds the payload for `product` and its planned `combinations`.
    ///
    /// `image` is the already-encoded image, shared by the parent only.
    #[must_use]
    pub fn build(
        product: &CatalogProduct,
        combinations: &[VariantCombination],
        image: Option<String>,
    ) -> Self {
        let attribute_lines = product
            .attribute_lines
            .iter()
            .map(AttributeLinePayload::from)
            .collect();

        let product_variants = combinations
            .iter()
            .map(|combo| VariantPayload {
                name: combo.display_name(&product.code),
                variant_description: combo.storage_descriptor(),
                list_price: product.base_price,
                purchase_price: product.purchase_price,
                attribute_value_ids: combo.external_value_ids(),
            })
            .collect();

        Self {
            default_code: product.code.clone(),
            name: product.name.clone(),
            list_price: product.base_price,
            purchase_price: product.purchase_price,
            image,
            attribute_lines,
            product_variants,
        }
    }

    /// `true` when the payload creates a parent without variants.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.product_variants.is_empty()
    }

    /// Stable key identifying this create request across retries.
    ///
    /// SHA-256 over the product code and the ordered variant descriptors.
    /// Prices, names and the image are excluded; re-sending the same variant
    /// set under a new price is still the same logical create.
    #[must_use]
    pub fn idempotency_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.default_code.as_bytes());
        for variant in &self.product_variants {
            hasher.update(b"\n");
            hasher.update(variant.variant_description.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

impl From<&AttributeLine> for AttributeLinePayload {
    fn from(line: &AttributeLine) -> Self {
        Self {
            attribute_id: line.attribute.id,
            attribute_name: line.attribute.name.clone(),
            values: line
                .values
                .iter()
                .map(|v| AttributeValuePayload {
                    id: v.external_id,
                    name: v.value.clone(),
                    sequence: v.sequence,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use varsync_core::{
        generate_combinations, Attribute, AttributeValue, SelectionGroup, VariantSelection,
    };

    fn selection() -> VariantSelection {
        let size = SelectionGroup {
            attribute: Attribute {
                id: 1,
                name: "Size".to_owned(),
                display_order: 1,
            },
            values: vec![
                AttributeValue {
                    id: 11,
                    attribute_id: 1,
                    value: "S".to_owned(),
                    external_id: 501,
                    sequence: 1,
                },
                AttributeValue {
                    id: 12,
                    attribute_id: 1,
                    value: "M".to_owned(),
                    external_id: 502,
                    sequence: 2,
                },
            ],
        };
        let color = SelectionGroup {
            attribute: Attribute {
                id: 2,
                name: "Color".to_owned(),
                display_order: 2,
            },
            values: vec![AttributeValue {
                id: 21,
                attribute_id: 2,
                value: "Red".to_owned(),
                external_id: 601,
                sequence: 1,
            }],
        };
        VariantSelection::from_groups(vec![size, color])
    }

    fn product(selection: &VariantSelection) -> CatalogProduct {
        CatalogProduct {
            code: "AO01".to_owned(),
            name: "Áo thun".to_owned(),
            base_price: 150_000,
            purchase_price: 90_000,
            image: None,
            attribute_lines: AttributeLine::from_selection(selection),
        }
    }

    #[test]
    fn build_includes_one_variant_per_combination() {
        let sel = selection();
        let combos = generate_combinations(&sel);
        let payload = ProductPayload::build(&product(&sel), &combos, None);
        assert_eq!(payload.product_variants.len(), 2);
        assert_eq!(payload.attribute_lines.len(), 2);
        assert!(!payload.is_simple());
        let first = &payload.product_variants[0];
        assert_eq!(first.name, "AO01 (Red, S)");
        assert_eq!(first.variant_description, "S, Red");
        assert_eq!(first.attribute_value_ids, vec![501, 601]);
        assert_eq!(first.list_price, 150_000);
    }

    #[test]
    fn simple_product_has_no_lines_or_variants() {
        let sel = VariantSelection::default();
        let payload = ProductPayload::build(&product(&sel), &[], None);
        assert!(payload.is_simple());
        assert!(payload.attribute_lines.is_empty());
    }

    #[test]
    fn serializes_with_pascal_case_and_omits_missing_image() {
        let sel = selection();
        let combos = generate_combinations(&sel);
        let payload = ProductPayload::build(&product(&sel), &combos, None);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["DefaultCode"], "AO01");
        assert_eq!(json["AttributeLines"][0]["Values"][1]["Id"], 502);
        assert_eq!(json["ProductVariants"][1]["Name"], "AO01 (Red, M)");
        assert!(json.get("Image").is_none());
    }

    #[test]
    fn idempotency_key_ignores_price_but_not_variants() {
        let sel = selection();
        let combos = generate_combinations(&sel);
        let base = ProductPayload::build(&product(&sel), &combos, None);

        let mut repriced = base.clone();
        repriced.list_price = 1;
        assert_eq!(base.idempotency_key(), repriced.idempotency_key());

        let fewer = ProductPayload::build(&product(&sel), &combos[..1], None);
        assert_ne!(base.idempotency_key(), fewer.idempotency_key());
        assert_eq!(base.idempotency_key().len(), 64);
    }
}
