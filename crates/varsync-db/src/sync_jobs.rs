//! Database operations for `sync_jobs` and `sync_job_items`.
//!
//! A job is created with every item `pending`. The batch worker moves each
//! item to `success` or `failed`; the progress tracker only reads.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use varsync_core::{ItemStatus, SyncItem};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `sync_jobs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncJobRow {
    pub id: i64,
    pub public_id: Uuid,
    /// The schema defines this as `INTEGER NOT NULL`.
    pub expected_item_count: i32,
    pub created_at: DateTime<Utc>,
}

/// A row from the `sync_job_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncJobItemRow {
    pub id: i64,
    pub job_id: i64,
    pub item_code: String,
    /// One of `pending`, `success`, `failed`.
    pub status: String,
    pub error_detail: Option<String>,
    /// The sync request as submitted.
    pub request: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncJobItemRow {
    /// Parses `status` into an [`ItemStatus`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Core`] if the stored status is not recognized.
    pub fn item_status(&self) -> Result<ItemStatus, DbError> {
        Ok(self.status.parse::<ItemStatus>()?)
    }
}

/// One item to enqueue with [`create_sync_job`].
#[derive(Debug, Clone)]
pub struct NewSyncItem {
    pub item_code: String,
    pub request: serde_json::Value,
}

// ---------------------------------------------------------------------------
// sync_jobs operations
// ---------------------------------------------------------------------------

/// Creates a job and one `pending` item row per entry, in one transaction.
///
/// Generates the job's public UUID in Rust. Item codes must be unique within
/// the batch.
///
/// # Errors
///
/// Returns [`DbError::BatchTooLarge`] if the item count does not fit the
/// schema's `INTEGER`, or [`DbError::Sqlx`] if any insert fails (the whole
/// job is rolled back).
pub async fn create_sync_job(pool: &PgPool, items: &[NewSyncItem]) -> Result<SyncJobRow, DbError> {
    let expected =
        i32::try_from(items.len()).map_err(|_| DbError::BatchTooLarge(items.len()))?;
    let public_id = Uuid::new_v4();

    let mut tx = pool.begin().await?;

    let job = sqlx::query_as::<_, SyncJobRow>(
        "INSERT INTO sync_jobs (public_id, expected_item_count) \
         VALUES ($1, $2) \
         RETURNING id, public_id, expected_item_count, created_at",
    )
    .bind(public_id)
    .bind(expected)
    .fetch_one(&mut *tx)
    .await?;

    if !items.is_empty() {
        let codes: Vec<&str> = items.iter().map(|i| i.item_code.as_str()).collect();
        let requests: Vec<serde_json::Value> = items.iter().map(|i| i.request.clone()).collect();

        sqlx::query(
            "INSERT INTO sync_job_items (job_id, item_code, request) \
             SELECT $1, code, request \
             FROM UNNEST($2::text[], $3::jsonb[]) AS t(code, request)",
        )
        .bind(job.id)
        .bind(&codes)
        .bind(&requests)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(job)
}

/// Fetches a job by its public UUID.
///
/// # Errors
///
/// Returns [`DbError::JobNotFound`] if no job has the given id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_sync_job(pool: &PgPool, public_id: Uuid) -> Result<SyncJobRow, DbError> {
    sqlx::query_as::<_, SyncJobRow>(
        "SELECT id, public_id, expected_item_count, created_at \
         FROM sync_jobs \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::JobNotFound(public_id))
}

// ---------------------------------------------------------------------------
// sync_job_items operations
// ---------------------------------------------------------------------------

/// Records the outcome of one item.
///
/// Overwrites any earlier status, so a re-driven item can move from
/// `failed` to `success`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the job has no item with that code, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_item_status(
    pool: &PgPool,
    public_id: Uuid,
    item_code: &str,
    status: ItemStatus,
    error_detail: Option<&str>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_job_items AS i \
         SET status = $1, error_detail = $2, updated_at = NOW() \
         FROM sync_jobs AS j \
         WHERE i.job_id = j.id AND j.public_id = $3 AND i.item_code = $4",
    )
    .bind(status.as_str())
    .bind(error_detail)
    .bind(public_id)
    .bind(item_code)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Returns the status of every item in a job, ordered by insertion.
///
/// This is the tracker's polling query. An unknown job yields an empty list.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Core`] if a
/// stored status is not recognized.
pub async fn list_item_statuses(pool: &PgPool, public_id: Uuid) -> Result<Vec<SyncItem>, DbError> {
    let rows = sqlx::query_as::<_, (String, String, Option<String>)>(
        "SELECT i.item_code, i.status, i.error_detail \
         FROM sync_job_items AS i \
         JOIN sync_jobs AS j ON j.id = i.job_id \
         WHERE j.public_id = $1 \
         ORDER BY i.id",
    )
    .bind(public_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(item_id, status, error_detail)| -> Result<SyncItem, DbError> {
            Ok(SyncItem {
                item_id,
                status: status.parse()?,
                error_detail,
            })
        })
        .collect()
}

/// Returns the failed items of a job, including their stored requests.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_failed_items(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Vec<SyncJobItemRow>, DbError> {
    let rows = sqlx::query_as::<_, SyncJobItemRow>(
        "SELECT i.id, i.job_id, i.item_code, i.status, i.error_detail, i.request, \
                i.created_at, i.updated_at \
         FROM sync_job_items AS i \
         JOIN sync_jobs AS j ON j.id = i.job_id \
         WHERE j.public_id = $1 AND i.status = 'failed' \
         ORDER BY i.id",
    )
    .bind(public_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
