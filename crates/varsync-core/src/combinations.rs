//! Cartesian expansion of a [`VariantSelection`] into sellable variants.
//!
//! Every combination yields two strings built from the same tokens:
//!
//! - the **storage descriptor**, values joined in attribute display order
//!   (`"29, S, Trắng"`), used for persistence and comparison;
//! - the **display label**, the same values in reverse order
//!   (`"Trắng, S, 29"`), used only for the catalog-facing name.
//!
//! Both orders are load-bearing. Downstream reconciliation parses the
//! catalog's name back into a storage descriptor, so neither may be derived
//! from the other by anything other than exact reversal.

use serde::{Deserialize, Serialize};

use crate::attributes::AttributeValue;
use crate::selection::VariantSelection;

/// Separator placed between value tokens in descriptors and labels.
pub const DESCRIPTOR_SEPARATOR: &str = ", ";

/// One element of the Cartesian product: exactly one value per selected
/// attribute, in attribute display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantCombination {
    pub values: Vec<AttributeValue>,
}

impl VariantCombination {
    /// Values joined in attribute display order, e.g. `"S, Red"`.
    #[must_use]
    pub fn storage_descriptor(&self) -> String {
        self.values
            .iter()
            .map(|v| v.value.as_str())
            .collect::<Vec<_>>()
            .join(DESCRIPTOR_SEPARATOR)
    }

    /// Values joined in reverse attribute order, e.g. `"Red, S"`.
    #[must_use]
    pub fn display_label(&self) -> String {
        self.values
            .iter()
            .rev()
            .map(|v| v.value.as_str())
            .collect::<Vec<_>>()
            .join(DESCRIPTOR_SEPARATOR)
    }

    /// Catalog-facing variant name: `"<code> (<display label>)"`.
    #[must_use]
    pub fn display_name(&self, code: &str) -> String {
        format!("{code} ({})", self.display_label())
    }

    /// Local attribute value ids, in attribute display order.
    #[must_use]
    pub fn value_ids(&self) -> Vec<i64> {
        self.values.iter().map(|v| v.id).collect()
    }

    /// External catalog ids of the values, in attribute display order.
    #[must_use]
    pub fn external_value_ids(&self) -> Vec<i64> {
        self.values.iter().map(|v| v.external_id).collect()
    }
}

/// Expands `selection` into its full Cartesian product.
///
/// The result has exactly `selection.combination_count()` elements and is
/// enumerated in odometer order: the last attribute varies fastest. An empty
/// selection yields an empty list; callers take the simple-product path
/// instead of calling this.
///
/// Values are not deduplicated. A selection containing the same value twice
/// produces duplicate combinations.
#[must_use]
pub fn generate_combinations(selection: &VariantSelection) -> Vec<VariantCombination> {
    let groups = selection.groups();
    if groups.is_empty() {
        return Vec::new();
    }

    let mut combinations = Vec::with_capacity(selection.combination_count());
    let mut odometer = vec![0usize; groups.len()];

    loop {
        let values = groups
            .iter()
            .zip(&odometer)
            .map(|(group, &idx)| group.values[idx].clone())
            .collect();
        combinations.push(VariantCombination { values });

        // Advance the rightmost wheel; carry leftwards on wrap.
        let mut position = groups.len();
        loop {
            if position == 0 {
                return combinations;
            }
            position -= 1;
            odometer[position] += 1;
            if odometer[position] < groups[position].values.len() {
                break;
            }
            odometer[position] = 0;
        }
    }
}

#[cfg(test)]
#[path = "combinations_test.rs"]
mod tests;
