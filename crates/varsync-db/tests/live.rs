//! Live integration tests for varsync-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/varsync-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use serde_json::json;
use uuid::Uuid;
use varsync_core::{CatalogProduct, CatalogVariant, ItemStatus};
use varsync_db::{
    create_sync_job, get_product_by_code, get_sync_job, list_all_attributes,
    list_attribute_values, list_attributes, list_failed_items, list_item_statuses,
    list_variants_for_parent, set_item_status, upsert_attribute, upsert_attribute_value,
    upsert_product, upsert_variants, DbError, NewSyncItem,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_product(code: &str) -> CatalogProduct {
    CatalogProduct {
        code: code.to_string(),
        name: "Áo thun".to_string(),
        base_price: 150_000,
        purchase_price: 90_000,
        image: Some("https://img.example.com/ao.png".to_string()),
        attribute_lines: vec![],
    }
}

fn make_variant(code: &str, parent: &str, descriptor: Option<&str>) -> CatalogVariant {
    CatalogVariant {
        code: code.to_string(),
        parent_code: parent.to_string(),
        external_variant_id: 9100,
        name: format!("{parent} ({})", descriptor.unwrap_or("?")),
        descriptor: descriptor.map(str::to_string),
        price: 150_000,
        stock: 0,
    }
}

fn new_item(code: &str) -> NewSyncItem {
    NewSyncItem {
        item_code: code.to_string(),
        request: json!({ "code": code }),
    }
}

async fn count_products(pool: &sqlx::PgPool, code: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE code = $1")
        .bind(code)
        .fetch_one(pool)
        .await
        .expect("count query failed")
}

// ---------------------------------------------------------------------------
// Section 1: Attribute catalog
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn attributes_are_ordered_by_display_order(pool: sqlx::PgPool) {
    let color = upsert_attribute(&pool, "Color", 2).await.unwrap();
    let size = upsert_attribute(&pool, "Size", 1).await.unwrap();

    let subset = list_attributes(&pool, &[color, size]).await.unwrap();
    let names: Vec<&str> = subset.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Size", "Color"]);

    let all = list_all_attributes(&pool).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn attribute_values_are_ordered_by_sequence(pool: sqlx::PgPool) {
    let size = upsert_attribute(&pool, "Size", 1).await.unwrap();
    let m = upsert_attribute_value(&pool, size, "M", 502, 2).await.unwrap();
    let s = upsert_attribute_value(&pool, size, "S", 501, 1).await.unwrap();

    let values = list_attribute_values(&pool, &[m, s, 999_999]).await.unwrap();
    assert_eq!(values.len(), 2, "unknown id must be absent, not an error");
    assert_eq!(values[0].value, "S");
    assert_eq!(values[0].external_id, 501);
    assert_eq!(values[1].value, "M");
}

#[sqlx::test(migrations = "../../migrations")]
async fn empty_id_lists_return_nothing(pool: sqlx::PgPool) {
    assert!(list_attributes(&pool, &[]).await.unwrap().is_empty());
    assert!(list_attribute_values(&pool, &[]).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Section 2: Product upserts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_product_is_idempotent_on_code(pool: sqlx::PgPool) {
    let first = upsert_product(&pool, &make_product("AO01"), Some(9001))
        .await
        .expect("first upsert failed");

    let mut renamed = make_product("AO01");
    renamed.name = "Áo thun mới".to_string();
    let second = upsert_product(&pool, &renamed, None)
        .await
        .expect("second upsert failed");

    assert_eq!(first, second, "same code must resolve to the same row");
    assert_eq!(count_products(&pool, "AO01").await, 1);

    let row = get_product_by_code(&pool, "AO01").await.unwrap().unwrap();
    assert_eq!(row.name, "Áo thun mới");
    assert_eq!(
        row.external_id,
        Some(9001),
        "a missing external id must not erase the recorded one"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_product_by_code_returns_none_for_unknown(pool: sqlx::PgPool) {
    assert!(get_product_by_code(&pool, "NOPE").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_variants_inserts_then_updates(pool: sqlx::PgPool) {
    upsert_product(&pool, &make_product("AO01"), Some(9001))
        .await
        .unwrap();

    let variants = vec![
        make_variant("AO01-1", "AO01", Some("Trắng, S")),
        make_variant("AO01-2", "AO01", None),
    ];
    let affected = upsert_variants(&pool, &variants).await.unwrap();
    assert_eq!(affected, 2);

    let mut updated = variants.clone();
    updated[1].descriptor = Some("Đỏ, S".to_string());
    upsert_variants(&pool, &updated).await.unwrap();

    let rows = list_variants_for_parent(&pool, "AO01").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].descriptor.as_deref(), Some("Trắng, S"));
    assert_eq!(rows[1].descriptor.as_deref(), Some("Đỏ, S"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_variants_keeps_first_of_repeated_codes(pool: sqlx::PgPool) {
    upsert_product(&pool, &make_product("AO01"), None).await.unwrap();

    let variants = vec![
        make_variant("AO01-1", "AO01", Some("Trắng, S")),
        make_variant("AO01-1", "AO01", Some("Đỏ, S")),
    ];
    let affected = upsert_variants(&pool, &variants).await.unwrap();
    assert_eq!(affected, 1);

    let rows = list_variants_for_parent(&pool, "AO01").await.unwrap();
    assert_eq!(rows[0].descriptor.as_deref(), Some("Trắng, S"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_variants_with_empty_slice_is_noop(pool: sqlx::PgPool) {
    assert_eq!(upsert_variants(&pool, &[]).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_variants_requires_parent(pool: sqlx::PgPool) {
    let err = upsert_variants(&pool, &[make_variant("X-1", "X", Some("S"))])
        .await
        .expect_err("variant without parent must fail");
    assert!(matches!(err, DbError::Sqlx(_)), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Section 3: Sync jobs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_sync_job_starts_all_items_pending(pool: sqlx::PgPool) {
    let job = create_sync_job(&pool, &[new_item("A"), new_item("B"), new_item("C")])
        .await
        .expect("create_sync_job failed");
    assert_eq!(job.expected_item_count, 3);

    let fetched = get_sync_job(&pool, job.public_id).await.unwrap();
    assert_eq!(fetched.id, job.id);

    let items = list_item_statuses(&pool, job.public_id).await.unwrap();
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| i.status == ItemStatus::Pending));
    assert_eq!(items[0].item_id, "A");
}

#[sqlx::test(migrations = "../../migrations")]
async fn set_item_status_updates_and_lists_failures(pool: sqlx::PgPool) {
    let job = create_sync_job(&pool, &[new_item("A"), new_item("B")])
        .await
        .unwrap();

    set_item_status(&pool, job.public_id, "A", ItemStatus::Success, None)
        .await
        .unwrap();
    set_item_status(
        &pool,
        job.public_id,
        "B",
        ItemStatus::Failed,
        Some("catalog rejected: 422"),
    )
    .await
    .unwrap();

    let items = list_item_statuses(&pool, job.public_id).await.unwrap();
    assert_eq!(items[0].status, ItemStatus::Success);
    assert_eq!(items[1].status, ItemStatus::Failed);
    assert_eq!(items[1].error_detail.as_deref(), Some("catalog rejected: 422"));

    let failed = list_failed_items(&pool, job.public_id).await.unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].item_code, "B");
    assert_eq!(failed[0].request, json!({ "code": "B" }));
}

#[sqlx::test(migrations = "../../migrations")]
async fn set_item_status_for_unknown_item_is_not_found(pool: sqlx::PgPool) {
    let job = create_sync_job(&pool, &[new_item("A")]).await.unwrap();
    let err = set_item_status(&pool, job.public_id, "Z", ItemStatus::Success, None)
        .await
        .expect_err("unknown item must fail");
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_sync_job_unknown_id_is_job_not_found(pool: sqlx::PgPool) {
    let id = Uuid::new_v4();
    let err = get_sync_job(&pool, id).await.expect_err("expected error");
    assert!(matches!(err, DbError::JobNotFound(found) if found == id));
    assert!(list_item_statuses(&pool, id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_item_codes_roll_back_the_whole_job(pool: sqlx::PgPool) {
    let err = create_sync_job(&pool, &[new_item("A"), new_item("A")])
        .await
        .expect_err("duplicate codes must fail");
    assert!(matches!(err, DbError::Sqlx(_)));

    let jobs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_jobs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(jobs, 0);
}
