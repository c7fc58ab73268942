//! HTML helpers shared by discovery and extraction
//!
//! This module handles:
//! - Resolving link hrefs into absolute page URLs
//! - Picking a page title for file naming

use scraper::{Html, Selector};
use url::Url;

/// Title sources, tried in order
const TITLE_SELECTORS: &[&str] = &["title", "h1", "h2"];

/// Used when neither the document nor the URL yields a title
pub const DEFAULT_TITLE: &str = "page";

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    // Same-page anchors
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Extracts a title from the document
///
/// Sources in order: `<title>`, the first `<h1>`, the first `<h2>`, then
/// `<meta property="og:title">`. Blank candidates are skipped.
pub fn page_title(document: &Html) -> Option<String> {
    for source in TITLE_SELECTORS {
        let Ok(selector) = Selector::parse(source) else {
            continue;
        };
        let text = document
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>());
        if let Some(title) = text.map(|t| collapse_whitespace(&t)).filter(|t| !t.is_empty()) {
            return Some(title);
        }
    }

    let selector = Selector::parse("meta[property='og:title']").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
}

/// Title used for the page's file name
///
/// Falls back to the last non-empty URL path segment, then to `page`.
pub fn title_or_fallback(document: &Html, url: &str) -> String {
    if let Some(title) = page_title(document) {
        return title;
    }

    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()).map(str::to_string))
        })
        .map(|segment| {
            urlencoding::decode(&segment)
                .map(|decoded| decoded.into_owned())
                .unwrap_or(segment)
        })
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
