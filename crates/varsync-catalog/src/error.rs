use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by catalog (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("catalog rejected request with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("image fetch from {url} failed with HTTP {status}")]
    ImageFetch { url: String, status: u16 },

    #[error("invalid catalog base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl CatalogError {
    /// HTTP status of the failed response, when one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::RateLimited { .. } => Some(429),
            Self::Rejected { status, .. } | Self::ImageFetch { status, .. } => Some(*status),
            Self::Deserialize { .. } | Self::InvalidBaseUrl { .. } => None,
        }
    }
}
