//! HTTP client for the external catalog's product endpoints.

mod endpoint;
mod image;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode, Url};
use varsync_core::AppConfig;

use crate::duplicate::is_duplicate_resource_error;
use crate::error::CatalogError;
use crate::payload::ProductPayload;
use crate::retry::retry_with_backoff;
use crate::types::CreatedProduct;

pub use image::EncodedImage;

/// Header carrying [`ProductPayload::idempotency_key`].
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// How the catalog answered a create request.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// 2xx with the authoritative product graph.
    Created(CreatedProduct),
    /// Non-2xx whose body the duplicate predicate recognized.
    AlreadyExists { status: u16, body: String },
}

/// HTTP client for the external catalog.
///
/// Non-2xx responses become typed errors, except duplicate-code rejections,
/// which [`Self::create_product`] reports as [`CreateOutcome::AlreadyExists`].
/// Transient errors (429, 5xx, network failures) are retried with
/// exponential back-off up to `max_retries` additional attempts.
pub struct CatalogClient {
    pub(super) client: Client,
    pub(super) base_url: Url,
    pub(super) api_token: Option<String>,
    pub(super) max_retries: u32,
    pub(super) backoff_base_ms: u64,
}

impl CatalogClient {
    /// Creates a client with the given timeout, `User-Agent` and retry policy.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidBaseUrl`] if `base_url` is not an http(s) URL.
    /// - [`CatalogError::Http`] if the underlying `reqwest::Client` cannot be
    ///   constructed.
    pub fn new(
        base_url: &str,
        api_token: Option<String>,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, CatalogError> {
        let base_url = endpoint::parse_base_url(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_token,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Builds a client from the `VARSYNC_CATALOG_*` settings.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, CatalogError> {
        Self::new(
            &config.catalog_base_url,
            config.catalog_api_token.clone(),
            config.catalog_request_timeout_secs,
            &config.catalog_user_agent,
            config.catalog_max_retries,
            config.catalog_retry_backoff_base_ms,
        )
    }

    /// Posts the parent and all variant rows in a single request.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Rejected`]: non-2xx that is not a duplicate
    ///   (5xx only after all retries).
    /// - [`CatalogError::RateLimited`]: HTTP 429 after all retries.
    /// - [`CatalogError::Http`]: network or TLS failure after all retries.
    /// - [`CatalogError::Deserialize`]: 2xx body is not a product graph.
    pub async fn create_product(
        &self,
        payload: &ProductPayload,
    ) -> Result<CreateOutcome, CatalogError> {
        let url = endpoint::endpoint_url(&self.base_url, &["products"])?;
        let key = payload.idempotency_key();

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            let key = key.clone();
            async move {
                let response = self
                    .authorized(self.client.post(url))
                    .header(IDEMPOTENCY_HEADER, key)
                    .json(payload)
                    .send()
                    .await?;
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    return Err(rate_limited(&response));
                }

                let body = response.text().await?;

                if status.is_success() {
                    let created = serde_json::from_str::<CreatedProduct>(&body).map_err(|e| {
                        CatalogError::Deserialize {
                            context: format!("create response for {}", payload.default_code),
                            source: e,
                        }
                    })?;
                    return Ok(CreateOutcome::Created(created));
                }

                if is_duplicate_resource_error(&body, status.as_u16()) {
                    return Ok(CreateOutcome::AlreadyExists {
                        status: status.as_u16(),
                        body,
                    });
                }

                Err(CatalogError::Rejected {
                    status: status.as_u16(),
                    body,
                })
            }
        })
        .await
    }

    /// Looks up an existing product by its code.
    ///
    /// Returns `Ok(None)` on 404.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_product`], minus the duplicate case.
    pub async fn find_product_by_code(
        &self,
        code: &str,
    ) -> Result<Option<CreatedProduct>, CatalogError> {
        let url = endpoint::endpoint_url(&self.base_url, &["products", "by-code", code])?;

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self.authorized(self.client.get(url)).send().await?;
                let status = response.status();

                if status == StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if status == StatusCode::TOO_MANY_REQUESTS {
                    return Err(rate_limited(&response));
                }

                let body = response.text().await?;
                if !status.is_success() {
                    return Err(CatalogError::Rejected {
                        status: status.as_u16(),
                        body,
                    });
                }

                serde_json::from_str::<CreatedProduct>(&body)
                    .map(Some)
                    .map_err(|e| CatalogError::Deserialize {
                        context: format!("product lookup for {code}"),
                        source: e,
                    })
            }
        })
        .await
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn rate_limited(response: &reqwest::Response) -> CatalogError {
    let retry_after_secs = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(60);
    CatalogError::RateLimited { retry_after_secs }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
