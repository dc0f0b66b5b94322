//! Per-attribute value selections, the input to the combination generator.

use std::collections::{HashMap, HashSet};

use crate::attributes::{Attribute, AttributeValue};
use crate::CoreError;

/// The chosen values for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionGroup {
    pub attribute: Attribute,
    pub values: Vec<AttributeValue>,
}

/// A user's selection of attribute values, grouped by attribute.
///
/// Groups are kept sorted by attribute `display_order` (ties broken by id);
/// that order drives both the storage descriptor and the payload's attribute
/// lines. Attributes with no selected value do not participate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantSelection {
    groups: Vec<SelectionGroup>,
}

impl VariantSelection {
    /// Builds a selection from pre-grouped values.
    ///
    /// Groups are re-sorted by display order and empty groups are dropped.
    /// Value order inside each group is kept as given, so callers must pass
    /// values already in catalog `sequence` order. Duplicates are not removed.
    #[must_use]
    pub fn from_groups(mut groups: Vec<SelectionGroup>) -> Self {
        groups.retain(|g| !g.values.is_empty());
        groups.sort_by_key(|g| (g.attribute.display_order, g.attribute.id));
        Self { groups }
    }

    /// Builds a selection from attribute catalog rows.
    ///
    /// Values are grouped under their attribute and sorted by `sequence`
    /// (ties broken by id).
    ///
    /// # Errors
    ///
    /// - [`CoreError::DuplicateValue`] if a value id appears more than once.
    /// - [`CoreError::UnknownAttribute`] if a value's attribute is not in
    ///   `attributes`.
    pub fn from_catalog(
        attributes: &[Attribute],
        values: &[AttributeValue],
    ) -> Result<Self, CoreError> {
        let mut seen = HashSet::with_capacity(values.len());
        for value in values {
            if !seen.insert(value.id) {
                return Err(CoreError::DuplicateValue { value_id: value.id });
            }
        }

        let by_id: HashMap<i64, &Attribute> = attributes.iter().map(|a| (a.id, a)).collect();
        let mut grouped: HashMap<i64, Vec<AttributeValue>> = HashMap::new();
        for value in values {
            if !by_id.contains_key(&value.attribute_id) {
                return Err(CoreError::UnknownAttribute {
                    value_id: value.id,
                    attribute_id: value.attribute_id,
                });
            }
            grouped
                .entry(value.attribute_id)
                .or_default()
                .push(value.clone());
        }

        let groups = grouped
            .into_iter()
            .map(|(attribute_id, mut values)| {
                values.sort_by_key(|v| (v.sequence, v.id));
                SelectionGroup {
                    attribute: by_id[&attribute_id].clone(),
                    values,
                }
            })
            .collect();

        Ok(Self::from_groups(groups))
    }

    #[must_use]
    pub fn groups(&self) -> &[SelectionGroup] {
        &self.groups
    }

    /// Returns `true` when no attribute has a selected value; callers take
    /// the simple-product path in that case.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of participating attributes.
    #[must_use]
    pub fn attribute_count(&self) -> usize {
        self.groups.len()
    }

    /// Size of the Cartesian product this selection expands to.
    ///
    /// Zero for an empty selection. Saturates instead of overflowing.
    #[must_use]
    pub fn combination_count(&self) -> usize {
        if self.groups.is_empty() {
            return 0;
        }
        self.groups
            .iter()
            .fold(1usize, |acc, g| acc.saturating_mul(g.values.len()))
    }
}
