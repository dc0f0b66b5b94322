pub mod client;
pub mod duplicate;
pub mod error;
pub mod naming;
pub mod payload;
pub mod retry;
pub mod types;

pub use client::{CatalogClient, CreateOutcome, EncodedImage};
pub use duplicate::is_duplicate_resource_error;
pub use error::CatalogError;
pub use naming::extract_variant_descriptor;
pub use payload::{AttributeLinePayload, AttributeValuePayload, ProductPayload, VariantPayload};
pub use types::{CreatedProduct, CreatedVariant};
