use serde::{Deserialize, Serialize};

/// A named axis of product variation, e.g. `"Size"` or `"Color"`.
///
/// `display_order` fixes where the attribute's values appear in generated
/// descriptors and in the catalog payload's attribute lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: i64,
    pub name: String,
    pub display_order: i32,
}

/// One concrete value on an [`Attribute`] axis, e.g. `"S"` on `"Size"`.
///
/// Reference data owned by the attribute catalog; never mutated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub id: i64,
    pub attribute_id: i64,
    pub value: String,
    /// Identifier of this value on the external catalog.
    pub external_id: i64,
    /// Catalog-assigned position of the value within its attribute.
    pub sequence: i32,
}
