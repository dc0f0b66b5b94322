//! Recognition of the catalog's "already exists" rejections.
//!
//! The catalog reports a duplicate product code as an ordinary error body,
//! in English or Vietnamese depending on the endpoint version. There is no
//! structured error code, so detection is substring matching. Keep every
//! signature here; nothing else in the workspace may inspect error text.

/// Lowercased substrings that identify a duplicate-resource rejection.
///
/// A bare "duplicate" is not enough: validation errors use it for repeated
/// attribute values, which are not conflicts on the product code.
const DUPLICATE_SIGNATURES: &[&str] = &[
    "already exists",
    "already exist",
    "duplicate key",
    "duplicate code",
    "duplicate default code",
    "duplicate defaultcode",
    "đã tồn tại",
    "da ton tai",
    "đã được sử dụng",
];

/// Returns `true` if a non-2xx response means the resource already exists.
///
/// A 2xx `status` is never a duplicate, whatever the body says.
#[must_use]
pub fn is_duplicate_resource_error(body: &str, status: u16) -> bool {
    if (200..300).contains(&status) {
        return false;
    }
    let lowered = body.to_lowercase();
    DUPLICATE_SIGNATURES.iter().any(|sig| lowered.contains(sig))
}
