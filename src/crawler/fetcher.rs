//! HTTP fetcher implementation
//!
//! This module handles the direct HTTP requests made outside the page
//! renderer, including:
//! - Building the HTTP client with a proper user agent string
//! - GET requests for sitemap documents
//! - Error classification for the retry policy
//! - Recognizing error pages served with a success status

use crate::config::UserAgentConfig;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Text fragments that mark a body as an error or bot-challenge page
pub const ERROR_MARKERS: &[&str] = &[
    "403 Forbidden",
    "404 Not Found",
    "500 Internal Server Error",
    "Access Denied",
    "Just a moment...",
];

/// Failure of a direct fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// Server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Transport failure (connection refused, timeout, reset, ...)
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Success status but the body is an error or challenge page
    #[error("{url} served an error page ({marker})")]
    ErrorPage { url: String, marker: &'static str },
}

impl FetchError {
    /// Returns true for failures worth another attempt
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 429 | Retry |
    /// | HTTP 5xx | Retry |
    /// | Timeout | Retry |
    /// | Connection failure | Give up |
    /// | Other HTTP status | Give up |
    /// | Error page marker | Give up |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || (500..600).contains(status)
            }
            Self::Network { source, .. } => source.is_timeout(),
            Self::ErrorPage { .. } => false,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use doc_mirror::config::UserAgentConfig;
/// use doc_mirror::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches `url` and returns its body as text
///
/// A success status whose body carries one of [`ERROR_MARKERS`] is reported
/// as [`FetchError::ErrorPage`].
pub async fn fetch_text(client: &Client, url: &str) -> Result<String, FetchError> {
    let network = |source| FetchError::Network {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(network)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(network)?;
    if let Some(marker) = find_error_marker(&body) {
        return Err(FetchError::ErrorPage {
            url: url.to_string(),
            marker,
        });
    }

    Ok(body)
}

/// Returns the first error marker contained in `text`
pub fn find_error_marker(text: &str) -> Option<&'static str> {
    ERROR_MARKERS.iter().copied().find(|marker| text.contains(marker))
}
