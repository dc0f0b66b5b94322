//! Source image download and transport encoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::CatalogError;
use crate::retry::retry_with_backoff;

use super::CatalogClient;

/// An image downloaded once and encoded for the catalog payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub source_url: String,
    pub content_type: Option<String>,
    /// Size of the raw downloaded bytes.
    pub byte_len: usize,
    /// Standard base64 of the raw bytes.
    pub base64: String,
}

impl CatalogClient {
    /// Downloads `url` and base64-encodes the body.
    ///
    /// The catalog bearer token is never sent to image hosts.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ImageFetch`]: non-2xx response.
    /// - [`CatalogError::Http`]: network failure after all retries.
    pub async fn fetch_image(&self, url: &str) -> Result<EncodedImage, CatalogError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(CatalogError::ImageFetch {
                    url: url.to_owned(),
                    status: status.as_u16(),
                });
            }

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let bytes = response.bytes().await?;

            tracing::debug!(url, bytes = bytes.len(), "downloaded product image");

            Ok(EncodedImage {
                source_url: url.to_owned(),
                content_type,
                byte_len: bytes.len(),
                base64: STANDARD.encode(&bytes),
            })
        })
        .await
    }
}
