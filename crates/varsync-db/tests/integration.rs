//! Offline unit tests for varsync-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::Utc;
use varsync_core::{AppConfig, CatalogVariant, Environment, ItemStatus};
use varsync_db::{PoolConfig, SyncJobItemRow, VariantRow};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        catalog_base_url: "https://catalog.example.com/api".to_string(),
        catalog_api_token: None,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        catalog_request_timeout_secs: 30,
        catalog_user_agent: "ua".to_string(),
        catalog_max_retries: 2,
        catalog_retry_backoff_base_ms: 500,
        price_scale: 1000,
        tracker_initial_interval_ms: 500,
        tracker_growth_factor: 1.2,
        tracker_max_interval_ms: 3000,
        tracker_max_polls: 60,
        batch_max_concurrent: 3,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn variant_row_converts_to_catalog_variant() {
    let row = VariantRow {
        id: 1,
        code: "AO01-1".to_string(),
        parent_code: "AO01".to_string(),
        external_variant_id: 9101,
        name: "AO01 (Trắng, S)".to_string(),
        descriptor: Some("Trắng, S".to_string()),
        price: 150_000,
        stock: 4,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let variant = CatalogVariant::from(row);
    assert_eq!(variant.code, "AO01-1");
    assert_eq!(variant.parent_code, "AO01");
    assert_eq!(variant.external_variant_id, 9101);
    assert_eq!(variant.descriptor.as_deref(), Some("Trắng, S"));
    assert_eq!(variant.stock, 4);
}

#[test]
fn sync_job_item_row_parses_status() {
    let mut row = SyncJobItemRow {
        id: 1,
        job_id: 1,
        item_code: "AO01".to_string(),
        status: "failed".to_string(),
        error_detail: Some("catalog rejected".to_string()),
        request: serde_json::json!({}),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    assert_eq!(row.item_status().unwrap(), ItemStatus::Failed);

    row.status = "archived".to_string();
    assert!(row.item_status().is_err());
}
