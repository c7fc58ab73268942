use crate::{UrlError, UrlResult};
use url::Url;

/// Tracking query parameters removed during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
];

/// Normalizes a discovered page URL
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything but http and https
/// 3. Require a host
/// 4. Remove the fragment (everything after #)
/// 5. Remove tracking query parameters, keeping the order of the rest
///
/// The path is left as-is: documentation sites often distinguish
/// `/guide` from `/guide/`.
///
/// # Examples
///
/// ```
/// use doc_mirror::url::normalize_url;
///
/// let url = normalize_url("https://Docs.Example.com/guide/#install").unwrap();
/// assert_eq!(url.as_str(), "https://docs.example.com/guide/");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    Ok(url)
}

/// Joins a site-relative path onto the configured base URL
///
/// Unlike [`Url::join`], a base URL with a path prefix keeps that prefix
/// whether or not it ends with `/`.
///
/// # Examples
///
/// ```
/// use doc_mirror::url::site_url;
///
/// let url = site_url("https://docs.example.com", "sitemap.xml").unwrap();
/// assert_eq!(url.as_str(), "https://docs.example.com/sitemap.xml");
///
/// let url = site_url("https://example.com/docs", "/5.3/en-US/").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs/5.3/en-US/");
/// ```
pub fn site_url(base_url: &str, path: &str) -> UrlResult<Url> {
    let joined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    normalize_url(&joined)
}
