//! Database operations for `products` and `product_variants`.
//!
//! Both tables are keyed by business code. Every write is an
//! `INSERT ... ON CONFLICT (code) DO UPDATE`, so re-running a sync for a code
//! that already exists updates the row in place.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use varsync_core::{CatalogProduct, CatalogVariant};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub list_price: i64,
    pub purchase_price: i64,
    pub image_url: Option<String>,
    /// Catalog-assigned id; `NULL` when the parent was recorded from request
    /// data after an "already exists" answer without a follow-up lookup.
    pub external_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `product_variants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantRow {
    pub id: i64,
    pub code: String,
    pub parent_code: String,
    pub external_variant_id: i64,
    pub name: String,
    /// `NULL` when the catalog name could not be parsed.
    pub descriptor: Option<String>,
    pub price: i64,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VariantRow> for CatalogVariant {
    fn from(row: VariantRow) -> Self {
        Self {
            code: row.code,
            parent_code: row.parent_code,
            external_variant_id: row.external_variant_id,
            name: row.name,
            descriptor: row.descriptor,
            price: row.price,
            stock: row.stock,
        }
    }
}

// ---------------------------------------------------------------------------
// products operations
// ---------------------------------------------------------------------------

/// Upserts a parent product row keyed by `code`.
///
/// On conflict, `name`, both prices and `image_url` are overwritten.
/// `external_id` is only overwritten when a new one is supplied, so a
/// request-data fallback never erases a catalog id recorded earlier.
///
/// Returns the internal `id` of the upserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_product(
    pool: &PgPool,
    product: &CatalogProduct,
    external_id: Option<i64>,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (code, name, list_price, purchase_price, image_url, external_id) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (code) DO UPDATE SET \
             name           = EXCLUDED.name, \
             list_price     = EXCLUDED.list_price, \
             purchase_price = EXCLUDED.purchase_price, \
             image_url      = EXCLUDED.image_url, \
             external_id    = COALESCE(EXCLUDED.external_id, products.external_id), \
             updated_at     = NOW() \
         RETURNING id",
    )
    .bind(&product.code)
    .bind(&product.name)
    .bind(product.base_price)
    .bind(product.purchase_price)
    .bind(&product.image)
    .bind(external_id)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns the product with the given code, if one exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_by_code(pool: &PgPool, code: &str) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, code, name, list_price, purchase_price, image_url, external_id, \
                created_at, updated_at \
         FROM products \
         WHERE code = $1",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// product_variants operations
// ---------------------------------------------------------------------------

/// Batch-upserts variant rows keyed by `code` in a single statement.
///
/// Rows are sent as parallel arrays and expanded with `UNNEST`. Postgres
/// rejects an `ON CONFLICT` statement that touches the same row twice, so
/// a repeated code keeps only its first occurrence.
///
/// Returns the number of rows inserted or updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails, including when a
/// `parent_code` has no `products` row.
pub async fn upsert_variants(pool: &PgPool, variants: &[CatalogVariant]) -> Result<u64, DbError> {
    let mut seen = HashSet::with_capacity(variants.len());
    let unique: Vec<&CatalogVariant> = variants
        .iter()
        .filter(|v| seen.insert(v.code.as_str()))
        .collect();

    if unique.is_empty() {
        return Ok(0);
    }

    let codes: Vec<&str> = unique.iter().map(|v| v.code.as_str()).collect();
    let parent_codes: Vec<&str> = unique.iter().map(|v| v.parent_code.as_str()).collect();
    let external_ids: Vec<i64> = unique.iter().map(|v| v.external_variant_id).collect();
    let names: Vec<&str> = unique.iter().map(|v| v.name.as_str()).collect();
    let descriptors: Vec<Option<&str>> = unique.iter().map(|v| v.descriptor.as_deref()).collect();
    let prices: Vec<i64> = unique.iter().map(|v| v.price).collect();
    let stocks: Vec<i64> = unique.iter().map(|v| v.stock).collect();

    let affected = sqlx::query(
        "INSERT INTO product_variants \
             (code, parent_code, external_variant_id, name, descriptor, price, stock) \
         SELECT * FROM UNNEST( \
             $1::text[], $2::text[], $3::bigint[], $4::text[], $5::text[], \
             $6::bigint[], $7::bigint[]) \
         ON CONFLICT (code) DO UPDATE SET \
             parent_code         = EXCLUDED.parent_code, \
             external_variant_id = EXCLUDED.external_variant_id, \
             name                = EXCLUDED.name, \
             descriptor          = EXCLUDED.descriptor, \
             price               = EXCLUDED.price, \
             stock               = EXCLUDED.stock, \
             updated_at          = NOW()",
    )
    .bind(&codes)
    .bind(&parent_codes)
    .bind(&external_ids)
    .bind(&names)
    .bind(&descriptors)
    .bind(&prices)
    .bind(&stocks)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected)
}

/// Returns all variants of a parent, ordered by `id` (insertion order).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_variants_for_parent(
    pool: &PgPool,
    parent_code: &str,
) -> Result<Vec<VariantRow>, DbError> {
    let rows = sqlx::query_as::<_, VariantRow>(
        "SELECT id, code, parent_code, external_variant_id, name, descriptor, \
                price, stock, created_at, updated_at \
         FROM product_variants \
         WHERE parent_code = $1 \
         ORDER BY id",
    )
    .bind(parent_code)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
