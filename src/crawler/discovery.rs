//! URL discovery
//!
//! Produces the list of pages to mirror through three tiers, each tried only
//! when the previous one found nothing:
//!
//! | Tier | Source | Retry |
//! |------|--------|-------|
//! | Sitemap | direct GET of `{base-url}/{sitemap-path}` plus sub-sitemaps | 429/5xx/timeouts |
//! | Rendered sitemap | the same document loaded through the renderer | renderer failures, one extra try on an error page |
//! | Navigation | links on the documentation root | navigation failures |
//!
//! The navigation tier never fails; an empty result from all tiers is left to
//! the caller to treat as fatal.

use crate::config::Config;
use crate::crawler::fetcher::{fetch_text, find_error_marker, FetchError};
use crate::crawler::retry::RetryPolicy;
use crate::render::{RenderError, SharedRenderer};
use crate::url::{dedup_normalized, is_within_docs, normalize_url, site_url};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Namespace of sitemaps.org documents
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Link selectors for the navigation tier, most specific first
pub const NAV_SELECTORS: &[&str] = &["nav a", ".navigation a", ".sidebar a", ".toc a", "a"];

/// `<loc>` values of one sitemap document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapEntries {
    /// `<url><loc>` values, in document order
    pub pages: Vec<String>,
    /// `<sitemap><loc>` values of a sitemap index
    pub sitemaps: Vec<String>,
}

impl SitemapEntries {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.sitemaps.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Malformed sitemap: {0}")]
    Sitemap(String),

    #[error("Rendered page is an error page ({0})")]
    ErrorMarker(&'static str),

    #[error("Invalid discovery URL: {0}")]
    Url(#[from] crate::UrlError),
}

/// One strategy in the discovery chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Sitemap,
    RenderedSitemap,
    Navigation,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Sitemap, Tier::RenderedSitemap, Tier::Navigation];
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Sitemap => "sitemap",
            Tier::RenderedSitemap => "rendered-sitemap",
            Tier::Navigation => "navigation",
        };
        f.write_str(name)
    }
}

/// Result of running a single tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierOutcome {
    /// Raw URLs, before normalization and scoping
    Found(Vec<String>),
    /// The source was usable but listed nothing
    Empty,
    /// The source could not be used
    Failed(String),
}

/// Parses a sitemap or sitemap index
///
/// Only elements in [`SITEMAP_NAMESPACE`] are considered. A leading byte
/// order mark and surrounding whitespace are ignored.
pub fn parse_sitemap(xml: &str) -> Result<SitemapEntries, DiscoveryError> {
    let trimmed = xml.trim_start_matches('\u{feff}').trim();
    let document =
        roxmltree::Document::parse(trimmed).map_err(|e| DiscoveryError::Sitemap(e.to_string()))?;

    let mut entries = SitemapEntries::default();
    for loc in document
        .descendants()
        .filter(|node| node.has_tag_name((SITEMAP_NAMESPACE, "loc")))
    {
        let Some(text) = loc.text().map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };
        match loc.parent_element() {
            Some(parent) if parent.has_tag_name((SITEMAP_NAMESPACE, "url")) => {
                entries.pages.push(text.to_string())
            }
            Some(parent) if parent.has_tag_name((SITEMAP_NAMESPACE, "sitemap")) => {
                entries.sitemaps.push(text.to_string())
            }
            _ => {}
        }
    }

    Ok(entries)
}

/// Finds a sitemap document embedded in rendered HTML
///
/// Browsers show raw XML inside a `<pre>` block or keep the `<urlset>` markup
/// inline beneath their own wrapper; both forms are recognized.
pub fn extract_embedded_xml(markup: &str) -> Option<String> {
    let document = Html::parse_document(markup);
    if let Ok(pre) = Selector::parse("pre") {
        for element in document.select(&pre) {
            let text: String = element.text().collect();
            if let Some(start) = text.find("<?xml") {
                return Some(text[start..].trim().to_string());
            }
        }
    }

    for (open, close) in [("<urlset", "</urlset>"), ("<sitemapindex", "</sitemapindex>")] {
        if let (Some(start), Some(end)) = (markup.find(open), markup.rfind(close)) {
            if end > start {
                return Some(markup[start..end + close.len()].to_string());
            }
        }
    }

    None
}

/// Parses a sitemap as delivered by the renderer
///
/// The source is parsed directly first, then any embedded XML is tried. Only
/// when neither yields entries is the page checked for error markers.
pub fn parse_rendered_sitemap(source: &str) -> Result<SitemapEntries, DiscoveryError> {
    let direct = parse_sitemap(source);
    if matches!(&direct, Ok(entries) if !entries.is_empty()) {
        return direct;
    }

    if let Some(embedded) = extract_embedded_xml(source) {
        if let Ok(entries) = parse_sitemap(&embedded) {
            if !entries.is_empty() {
                return Ok(entries);
            }
        }
    }

    if let Some(marker) = find_error_marker(source) {
        return Err(DiscoveryError::ErrorMarker(marker));
    }

    direct
}

/// Runs the discovery chain for one documentation site
pub struct Discovery {
    client: Client,
    renderer: SharedRenderer,
    base_url: String,
    docs_path: String,
    sitemap_path: String,
    max_depth: usize,
    retry: RetryPolicy,
    page_timeout: Duration,
}

impl Discovery {
    pub fn new(config: &Config, client: Client, renderer: SharedRenderer) -> Self {
        Self {
            client,
            renderer,
            base_url: config.crawler.base_url.clone(),
            docs_path: config.crawler.docs_path.clone(),
            sitemap_path: config.discovery.sitemap_path.clone(),
            max_depth: config.discovery.max_sitemap_depth,
            retry: config.retry.policy(),
            page_timeout: config.crawler.page_load_timeout(),
        }
    }

    /// Returns the normalized, deduplicated, in-scope page URLs of the site
    ///
    /// URLs keep the order in which their tier listed them.
    pub async fn discover(&self) -> Vec<String> {
        for tier in Tier::ALL {
            let started = Instant::now();
            let outcome = self.run_tier(tier).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match outcome {
                TierOutcome::Found(raw) => {
                    let found = raw.len();
                    let urls = self.finalize(raw);
                    if !urls.is_empty() {
                        tracing::info!(
                            "Discovery tier {} found {} URLs ({} in scope) in {}ms",
                            tier,
                            found,
                            urls.len(),
                            elapsed_ms
                        );
                        return urls;
                    }
                    tracing::warn!(
                        "Discovery tier {} found {} URLs but none under {} ({}ms)",
                        tier,
                        found,
                        self.docs_path,
                        elapsed_ms
                    );
                }
                TierOutcome::Empty => {
                    tracing::info!("Discovery tier {} found nothing ({}ms)", tier, elapsed_ms);
                }
                TierOutcome::Failed(reason) => {
                    tracing::warn!(
                        "Discovery tier {} failed after {}ms: {}",
                        tier,
                        elapsed_ms,
                        reason
                    );
                }
            }
        }

        Vec::new()
    }

    /// Runs a single tier
    pub async fn run_tier(&self, tier: Tier) -> TierOutcome {
        match tier {
            Tier::Sitemap => self.sitemap_tier().await,
            Tier::RenderedSitemap => self.rendered_sitemap_tier().await,
            Tier::Navigation => self.navigation_tier().await,
        }
    }

    fn sitemap_url(&self) -> Result<String, DiscoveryError> {
        Ok(site_url(&self.base_url, &self.sitemap_path)?.to_string())
    }

    fn finalize(&self, raw: Vec<String>) -> Vec<String> {
        dedup_normalized(raw)
            .into_iter()
            .filter(|url| match normalize_url(url) {
                Ok(parsed) => is_within_docs(&parsed, &self.docs_path),
                Err(_) => false,
            })
            .collect()
    }

    async fn sitemap_tier(&self) -> TierOutcome {
        let root = match self.sitemap_url() {
            Ok(url) => url,
            Err(e) => return TierOutcome::Failed(e.to_string()),
        };
        let outcome = self
            .walk_sitemaps(root, |url| async move { self.fetch_sitemap(&url).await })
            .await;
        into_outcome(outcome)
    }

    async fn rendered_sitemap_tier(&self) -> TierOutcome {
        let root = match self.sitemap_url() {
            Ok(url) => url,
            Err(e) => return TierOutcome::Failed(e.to_string()),
        };
        let outcome = self
            .walk_sitemaps(root, |url| async move { self.load_rendered_sitemap(&url).await })
            .await;
        into_outcome(outcome)
    }

    /// Breadth-first walk over a sitemap and its sub-sitemaps
    ///
    /// A failure of the root document fails the walk; failed sub-sitemaps
    /// are skipped. Each sitemap URL is loaded at most once and nesting
    /// stops at `max-sitemap-depth`.
    async fn walk_sitemaps<F, Fut>(&self, root: String, mut load: F) -> Result<Vec<String>, DiscoveryError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<SitemapEntries, DiscoveryError>>,
    {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([(root, 0usize)]);
        let mut pages = Vec::new();

        while let Some((url, depth)) = queue.pop_front() {
            if !visited.insert(url.clone()) {
                tracing::debug!("Sitemap {} already visited", url);
                continue;
            }

            match load(url.clone()).await {
                Ok(entries) => {
                    tracing::debug!(
                        "Sitemap {} lists {} pages and {} sitemaps",
                        url,
                        entries.pages.len(),
                        entries.sitemaps.len()
                    );
                    pages.extend(entries.pages);
                    if depth < self.max_depth {
                        queue.extend(entries.sitemaps.into_iter().map(|s| (s, depth + 1)));
                    } else if !entries.sitemaps.is_empty() {
                        tracing::warn!(
                            "Sitemap depth limit {} reached, ignoring {} nested sitemaps in {}",
                            self.max_depth,
                            entries.sitemaps.len(),
                            url
                        );
                    }
                }
                Err(e) if depth == 0 => return Err(e),
                Err(e) => tracing::warn!("Skipping sub-sitemap {}: {}", url, e),
            }
        }

        Ok(pages)
    }

    async fn fetch_sitemap(&self, url: &str) -> Result<SitemapEntries, DiscoveryError> {
        let body = self
            .retry
            .run("sitemap fetch", FetchError::is_retryable, |_| {
                fetch_text(&self.client, url)
            })
            .await?;
        parse_sitemap(&body)
    }

    /// Loads a sitemap through the renderer
    ///
    /// Renderer failures are retried with the configured policy. The first
    /// error page earns one more attempt; a second ends the load.
    async fn load_rendered_sitemap(&self, url: &str) -> Result<SitemapEntries, DiscoveryError> {
        let error_pages = AtomicU32::new(0);
        let is_retryable = |e: &DiscoveryError| match e {
            DiscoveryError::Render(_) => true,
            DiscoveryError::ErrorMarker(_) => error_pages.fetch_add(1, Ordering::SeqCst) == 0,
            _ => false,
        };

        self.retry
            .run("rendered sitemap", is_retryable, |attempt| async move {
                let source = self.render_source(url, attempt).await?;
                parse_rendered_sitemap(&source)
            })
            .await
    }

    /// Navigates, waits for ready and returns the page source; the wait grows
    /// with each attempt
    async fn render_source(&self, url: &str, attempt: u32) -> Result<String, RenderError> {
        let mut renderer = self.renderer.lock().await;
        renderer.navigate(url).await?;
        renderer.wait_for_ready(self.page_timeout * attempt).await?;
        renderer.page_source().await
    }

    async fn navigation_tier(&self) -> TierOutcome {
        let root = match site_url(&self.base_url, &self.docs_path) {
            Ok(url) => url.to_string(),
            Err(e) => return TierOutcome::Failed(e.to_string()),
        };

        let loaded = self
            .retry
            .run("navigation root", RenderError::is_transient, |attempt| {
                let root = root.as_str();
                async move { self.render_source(root, attempt).await }
            })
            .await;
        if let Err(e) = loaded {
            return TierOutcome::Failed(e.to_string());
        }

        let mut seen = HashSet::new();
        let mut links = Vec::new();
        let mut renderer = self.renderer.lock().await;

        for selector in NAV_SELECTORS {
            let scoped = format!("{}[href*='{}']", selector, self.docs_path);
            match renderer.find_elements(&scoped).await {
                Ok(elements) => {
                    for href in elements.into_iter().filter_map(|element| element.href) {
                        if href.contains(&self.docs_path) && seen.insert(href.clone()) {
                            links.push(href);
                        }
                    }
                }
                Err(e) => tracing::debug!("Selector {} failed: {}", scoped, e),
            }
        }

        if links.is_empty() {
            TierOutcome::Empty
        } else {
            TierOutcome::Found(links)
        }
    }
}

fn into_outcome(result: Result<Vec<String>, DiscoveryError>) -> TierOutcome {
    match result {
        Ok(pages) if pages.is_empty() => TierOutcome::Empty,
        Ok(pages) => TierOutcome::Found(pages),
        Err(e) => TierOutcome::Failed(e.to_string()),
    }
}
