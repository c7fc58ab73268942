//! Main-content extraction
//!
//! Pages are loaded through the renderer, checked for error pages, stripped
//! of navigation and other boilerplate, and reduced to their primary content
//! region. The whole load-and-extract cycle is retried with growing waits.

use crate::crawler::fetcher::find_error_marker;
use crate::crawler::parser::title_or_fallback;
use crate::crawler::retry::RetryPolicy;
use crate::render::{RenderError, SharedRenderer};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use thiserror::Error;

/// Elements removed before looking for content
pub const BOILERPLATE_SELECTORS: &[&str] = &[
    "nav",
    "header",
    "footer",
    "aside",
    "script",
    "style",
    "noscript",
    "iframe",
    ".navigation",
    ".sidebar",
    ".navbar",
    ".menu",
    ".breadcrumb",
    ".breadcrumbs",
    ".toc",
    ".ads",
    ".advertisement",
    ".cookie-banner",
    ".modal",
    "[role=navigation]",
    "[role=banner]",
    "[role=contentinfo]",
];

/// Content regions, most specific first; `body` is the final fallback
pub const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "[role=main]",
    ".main-content",
    ".content",
    "#content",
    ".documentation",
    "article",
    ".article-content",
    ".doc-content",
];

/// A region must carry more visible text than this to be accepted
pub const MIN_REGION_TEXT: usize = 50;

/// Raw markup shorter than this is treated as a failed load
pub const MIN_MARKUP_LEN: usize = 100;

/// Below this size the whole markup is scanned for error markers, above it
/// only the title and first heading
const SMALL_PAGE_LEN: usize = 1024;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Rejected markup: {0}")]
    Rejected(String),

    #[error("No content region found")]
    NoContent,
}

impl ExtractError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Render(e) => e.is_transient(),
            Self::Rejected(_) | Self::NoContent => true,
        }
    }
}

/// What one fetch-and-extract cycle produces
pub type ExtractOutcome = Result<ExtractedPage, ExtractError>;

/// Content of one page, ready for writing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub url: String,
    /// Serialized content region
    pub content: String,
    /// Title for the file name (document title, heading or URL segment)
    pub title: String,
}

/// Checks raw markup before extraction
///
/// Rejects empty markup, markup shorter than [`MIN_MARKUP_LEN`] and error
/// pages. Error markers are looked for in the title and first `<h1>`, or
/// anywhere in small pages.
pub fn validate_markup(markup: &str) -> Result<(), ExtractError> {
    let trimmed = markup.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::Rejected("empty markup".to_string()));
    }
    if trimmed.chars().count() < MIN_MARKUP_LEN {
        return Err(ExtractError::Rejected(format!(
            "markup shorter than {} characters",
            MIN_MARKUP_LEN
        )));
    }

    let marker = if trimmed.len() < SMALL_PAGE_LEN {
        find_error_marker(trimmed)
    } else {
        let document = Html::parse_document(trimmed);
        ["title", "h1"]
            .iter()
            .filter_map(|source| Selector::parse(source).ok())
            .filter_map(|selector| {
                document
                    .select(&selector)
                    .next()
                    .map(|element| element.text().collect::<String>())
            })
            .find_map(|text| find_error_marker(&text))
    };

    match marker {
        Some(marker) => Err(ExtractError::Rejected(format!("error page ({})", marker))),
        None => Ok(()),
    }
}

/// Strips boilerplate and returns the primary content region
///
/// Returns the serialized region together with the cleaned document, or
/// `None` when the markup has no `<body>` to fall back on.
pub fn extract_content(markup: &str) -> Option<(String, Html)> {
    let mut document = Html::parse_document(markup);
    strip_boilerplate(&mut document);

    let region = CONTENT_SELECTORS
        .iter()
        .filter_map(|source| Selector::parse(source).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .find(|element| visible_text_len(element) > MIN_REGION_TEXT)
                .map(|element| element.html())
        })
        .or_else(|| {
            let body = Selector::parse("body").ok()?;
            document.select(&body).next().map(|element| element.html())
        })?;

    Some((region, document))
}

fn strip_boilerplate(document: &mut Html) {
    for source in BOILERPLATE_SELECTORS {
        let Ok(selector) = Selector::parse(source) else {
            continue;
        };
        let ids: Vec<_> = document.select(&selector).map(|element| element.id()).collect();
        for id in ids {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }
}

/// Length of the element's text with whitespace runs collapsed
fn visible_text_len(element: &ElementRef<'_>) -> usize {
    let text: String = element.text().collect();
    let words: Vec<&str> = text.split_whitespace().collect();
    words.iter().map(|word| word.chars().count()).sum::<usize>() + words.len().saturating_sub(1)
}

/// Validates, extracts and titles one page's markup
pub fn extract_page(url: &str, markup: &str) -> ExtractOutcome {
    validate_markup(markup)?;
    let (content, document) = extract_content(markup).ok_or(ExtractError::NoContent)?;
    let title = title_or_fallback(&document, url);

    Ok(ExtractedPage {
        url: url.to_string(),
        content,
        title,
    })
}

/// Runs the load-wait-extract cycle against the shared renderer
pub struct ContentExtractor {
    renderer: SharedRenderer,
    retry: RetryPolicy,
    page_timeout: Duration,
}

impl ContentExtractor {
    pub fn new(renderer: SharedRenderer, retry: RetryPolicy, page_timeout: Duration) -> Self {
        Self {
            renderer,
            retry,
            page_timeout,
        }
    }

    /// Loads `url` and extracts its content
    ///
    /// Every attempt issues a fresh page load and waits longer for the
    /// document to become ready. Timeouts, rejected markup and missing
    /// content are retried; permanent HTTP errors are not.
    pub async fn fetch_and_extract(&self, url: &str) -> ExtractOutcome {
        self.retry
            .run("extract", ExtractError::is_retryable, |attempt| async move {
                let markup = self.load(url, attempt).await?;
                extract_page(url, &markup)
            })
            .await
    }

    async fn load(&self, url: &str, attempt: u32) -> Result<String, RenderError> {
        let mut renderer = self.renderer.lock().await;
        renderer.navigate(url).await?;
        renderer.wait_for_ready(self.page_timeout * attempt).await?;
        renderer.page_source().await
    }
}
