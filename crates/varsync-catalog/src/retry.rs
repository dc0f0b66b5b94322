//! Retry with exponential back-off and jitter for catalog requests.
//!
//! Transient failures (network errors, 429, 5xx) are retried. Everything
//! else, including the duplicate classification, is decided by the caller
//! on the first non-transient response.

use std::future::Future;
use std::time::Duration;

use crate::error::CatalogError;

/// Upper bound for a single back-off sleep.
const MAX_DELAY_MS: u64 = 30_000;

/// Returns `true` if `err` represents a transient condition worth retrying.
///
/// Retriable:
/// - [`CatalogError::RateLimited`]: HTTP 429.
/// - [`CatalogError::Http`]: timeout, connection failure, or a 5xx status.
/// - [`CatalogError::Rejected`] with a 5xx status.
///
/// Not retriable: 4xx rejections, image fetch failures, malformed bodies and
/// invalid base URLs. Retrying would return the same result.
pub(crate) fn is_retriable(err: &CatalogError) -> bool {
    match err {
        CatalogError::RateLimited { .. } => true,
        CatalogError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        CatalogError::Rejected { status, .. } => *status >= 500,
        CatalogError::ImageFetch { .. }
        | CatalogError::Deserialize { .. }
        | CatalogError::InvalidBaseUrl { .. } => false,
    }
}

/// Executes `operation`, retrying transient errors up to `max_retries` times.
///
/// The wait before the n-th retry is `backoff_base_ms * 2^(n-1)`, capped at
/// [`MAX_DELAY_MS`] and jittered by ±25 %. With `max_retries = 2` the
/// operation runs at most 3 times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, CatalogError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CatalogError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient catalog error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
