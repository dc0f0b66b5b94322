//! Order-insensitive comparison of free-text variant descriptors.
//!
//! A descriptor is a list of tokens separated by `,` or `|`, typed by hand
//! (`"Đỏ,S,1"`) or generated (`"1, S, Đỏ"`). Two descriptors are equivalent
//! when their normalized token lists are equal after sorting, so token
//! order, letter case, diacritics, spacing and wrapping parentheses never
//! matter.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::products::CatalogVariant;

const TOKEN_SEPARATORS: [char; 2] = [',', '|'];

/// Normalizes a single descriptor token.
///
/// Trims, strips enclosing parentheses, removes diacritics (including the
/// Vietnamese `đ`, which has no Unicode decomposition), collapses internal
/// whitespace and uppercases.
#[must_use]
pub fn normalize_token(token: &str) -> String {
    let unwrapped = token
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')');

    let folded: String = unwrapped
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .collect();

    folded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Splits `descriptor` into normalized tokens, drops empty ones and sorts
/// the rest. The result is the comparison key for [`descriptors_match`].
#[must_use]
pub fn descriptor_key(descriptor: &str) -> Vec<String> {
    let mut tokens: Vec<String> = descriptor
        .split(TOKEN_SEPARATORS)
        .map(normalize_token)
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort_unstable();
    tokens
}

/// Returns `true` if the two descriptors name the same variant.
///
/// An empty descriptor (or one with no non-empty tokens) never matches
/// anything, including another empty descriptor.
#[must_use]
pub fn descriptors_match(left: &str, right: &str) -> bool {
    let left = descriptor_key(left);
    if left.is_empty() {
        return false;
    }
    let right = descriptor_key(right);
    left.len() == right.len() && left == right
}

/// Finds the first variant whose stored descriptor is equivalent to
/// `descriptor`. Variants without a stored descriptor are skipped.
#[must_use]
pub fn find_matching_variant<'a>(
    descriptor: &str,
    candidates: &'a [CatalogVariant],
) -> Option<&'a CatalogVariant> {
    let key = descriptor_key(descriptor);
    if key.is_empty() {
        return None;
    }
    candidates.iter().find(|candidate| {
        candidate
            .descriptor
            .as_deref()
            .is_some_and(|d| descriptor_key(d) == key)
    })
}
