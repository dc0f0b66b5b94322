//! Endpoint URL construction relative to the configured catalog base URL.

use reqwest::Url;

use crate::error::CatalogError;

/// Parses `base_url` and checks it can carry path segments.
pub(super) fn parse_base_url(base_url: &str) -> Result<Url, CatalogError> {
    let url = Url::parse(base_url).map_err(|e| CatalogError::InvalidBaseUrl {
        base_url: base_url.to_owned(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(CatalogError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: "expected an http(s) URL".to_owned(),
        });
    }
    Ok(url)
}

/// Appends `segments` to the base URL's path, percent-encoding each one.
///
/// `https://catalog.example.com/api/` + `["products", "AO 01"]` becomes
/// `https://catalog.example.com/api/products/AO%2001`.
pub(super) fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, CatalogError> {
    let mut url = base.clone();
    url.set_query(None);
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| CatalogError::InvalidBaseUrl {
                base_url: base.to_string(),
                reason: "URL cannot be a base".to_owned(),
            })?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}
