//! Crawler module for discovering, extracting and saving pages
//!
//! This module contains the core mirroring logic, including:
//! - Sitemap and navigation-based URL discovery
//! - Direct HTTP fetching for sitemap documents
//! - Main-content extraction with retry
//! - The retry/backoff policy shared by every call site
//! - Overall crawl coordination

mod coordinator;
pub mod discovery;
pub mod extractor;
mod fetcher;
mod parser;
mod retry;

pub use coordinator::Coordinator;
pub use discovery::{Discovery, SitemapEntries, Tier, TierOutcome};
pub use extractor::{extract_content, ContentExtractor, ExtractError, ExtractOutcome, ExtractedPage};
pub use fetcher::{build_http_client, fetch_text, FetchError};
pub use parser::{page_title, resolve_link, title_or_fallback};
pub use retry::{RetryDecision, RetryPolicy};

use crate::config::Config;
use crate::output::CrawlSummary;
use crate::DocsError;

/// Runs a complete crawl operation
///
/// This is the main entry point for mirroring a site. It will:
/// 1. Build the HTTP client and open the renderer session
/// 2. Resolve the PDF writer strategy
/// 3. Discover the documentation URLs
/// 4. Extract and write every page
/// 5. Close the renderer and return the summary
///
/// # Example
///
/// ```no_run
/// use doc_mirror::config::load_config;
/// use doc_mirror::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let summary = crawl(config).await?;
/// summary.print();
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config) -> Result<CrawlSummary, DocsError> {
    let mut coordinator = Coordinator::new(config).await?;
    coordinator.run().await
}
