//! Domain types and pure algorithms for catalog variant synchronization.
//!
//! Nothing in this crate performs I/O. The combination generator, the
//! descriptor normalizer, and price normalization are all plain functions
//! over plain data so the sync orchestrator and reporting code can share them.

pub mod app_config;
pub mod attributes;
pub mod combinations;
pub mod config;
pub mod descriptor;
pub mod jobs;
pub mod price;
pub mod products;
pub mod selection;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use attributes::{Attribute, AttributeValue};
pub use combinations::{generate_combinations, VariantCombination, DESCRIPTOR_SEPARATOR};
pub use config::{load_app_config, load_app_config_from_env};
pub use descriptor::{descriptor_key, descriptors_match, find_matching_variant, normalize_token};
pub use jobs::{BatchOutcome, ItemStatus, ProgressSnapshot, SyncItem, TrackerReport, TrackerState};
pub use price::{normalize_price, try_normalize_price, PriceInput, DEFAULT_PRICE_SCALE};
pub use products::{AttributeLine, CatalogProduct, CatalogVariant};
pub use selection::{SelectionGroup, VariantSelection};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("attribute value {value_id} references unknown attribute {attribute_id}")]
    UnknownAttribute { value_id: i64, attribute_id: i64 },

    #[error("attribute value {value_id} selected more than once")]
    DuplicateValue { value_id: i64 },

    #[error("invalid item status: {0}")]
    InvalidItemStatus(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
