//! Read access to the attribute catalog: `attributes` and `attribute_values`.
//!
//! The catalog is reference data. The upserts exist for seeding and tests;
//! the sync path only reads.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use varsync_core::{Attribute, AttributeValue};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `attributes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttributeRow {
    pub id: i64,
    pub name: String,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

impl From<AttributeRow> for Attribute {
    fn from(row: AttributeRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            display_order: row.display_order,
        }
    }
}

/// A row from the `attribute_values` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttributeValueRow {
    pub id: i64,
    pub attribute_id: i64,
    pub value: String,
    pub external_id: i64,
    pub sequence: i32,
}

impl From<AttributeValueRow> for AttributeValue {
    fn from(row: AttributeValueRow) -> Self {
        Self {
            id: row.id,
            attribute_id: row.attribute_id,
            value: row.value,
            external_id: row.external_id,
            sequence: row.sequence,
        }
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns every attribute, ordered by `display_order` then `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_all_attributes(pool: &PgPool) -> Result<Vec<Attribute>, DbError> {
    let rows = sqlx::query_as::<_, AttributeRow>(
        "SELECT id, name, display_order, created_at \
         FROM attributes \
         ORDER BY display_order, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Attribute::from).collect())
}

/// Returns the attributes with the given ids, ordered by `display_order`
/// then `id`. Unknown ids are silently absent from the result.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_attributes(pool: &PgPool, ids: &[i64]) -> Result<Vec<Attribute>, DbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, AttributeRow>(
        "SELECT id, name, display_order, created_at \
         FROM attributes \
         WHERE id = ANY($1) \
         ORDER BY display_order, id",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Attribute::from).collect())
}

/// Returns the attribute values with the given ids, ordered by attribute,
/// `sequence`, then `id`. Unknown ids are silently absent from the result;
/// callers compare lengths to detect them.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_attribute_values(
    pool: &PgPool,
    ids: &[i64],
) -> Result<Vec<AttributeValue>, DbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, AttributeValueRow>(
        "SELECT id, attribute_id, value, external_id, sequence \
         FROM attribute_values \
         WHERE id = ANY($1) \
         ORDER BY attribute_id, sequence, id",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(AttributeValue::from).collect())
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Upserts an attribute keyed by `name`. Returns its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_attribute(
    pool: &PgPool,
    name: &str,
    display_order: i32,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO attributes (name, display_order) \
         VALUES ($1, $2) \
         ON CONFLICT (name) DO UPDATE SET \
             display_order = EXCLUDED.display_order, \
             updated_at    = NOW() \
         RETURNING id",
    )
    .bind(name)
    .bind(display_order)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Upserts a value keyed by `(attribute_id, value)`. Returns its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails, including when
/// `external_id` is already used by a different value.
pub async fn upsert_attribute_value(
    pool: &PgPool,
    attribute_id: i64,
    value: &str,
    external_id: i64,
    sequence: i32,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO attribute_values (attribute_id, value, external_id, sequence) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (attribute_id, value) DO UPDATE SET \
             external_id = EXCLUDED.external_id, \
             sequence    = EXCLUDED.sequence, \
             updated_at  = NOW() \
         RETURNING id",
    )
    .bind(attribute_id)
    .bind(value)
    .bind(external_id)
    .bind(sequence)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
