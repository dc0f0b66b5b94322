//! Parsing of catalog-chosen variant names.
//!
//! The catalog names variants `"<code> (<v3>, <v2>, <v1>)"` and may prepend
//! its own parenthetical metadata (`"AO01 (KM) (Trắng, S, 29)"`). The value
//! list is the last parenthesized group, and it must close the name.

use std::sync::LazyLock;

use regex::Regex;

static TRAILING_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()]*)\)\s*$").expect("valid regex"));

/// Extracts the value list from a catalog variant name.
///
/// Returns `None` when the name does not end in a non-empty parenthesized
/// group, so callers can flag the variant instead of storing a wrong
/// descriptor.
#[must_use]
pub fn extract_variant_descriptor(name: &str) -> Option<String> {
    TRAILING_GROUP
        .captures(name)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
