//! URL handling module for doc-mirror
//!
//! This module provides URL normalization, base-URL joining and the
//! documentation-scope check applied to discovered URLs.

mod normalize;

pub use normalize::{normalize_url, site_url};

use url::Url;

/// Returns true if `url` lies inside the documentation tree
///
/// The check mirrors the link selectors used during navigation discovery:
/// the URL's path must contain `docs_path`. A docs path of `/` accepts
/// everything on any host.
///
/// # Arguments
///
/// * `url` - A normalized page URL
/// * `docs_path` - The configured documentation path prefix
pub fn is_within_docs(url: &Url, docs_path: &str) -> bool {
    docs_path == "/" || url.path().contains(docs_path)
}

/// Deduplicates URLs while keeping first-seen order
///
/// Entries that fail normalization are dropped with a debug log.
pub fn dedup_normalized<I>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    let mut ordered = Vec::new();

    for raw in urls {
        match normalize_url(&raw) {
            Ok(url) => {
                let url = url.to_string();
                if seen.insert(url.clone()) {
                    ordered.push(url);
                }
            }
            Err(e) => tracing::debug!("Dropping discovered URL {}: {}", raw, e),
        }
    }

    ordered
}
