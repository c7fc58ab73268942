//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the mirroring process, including:
//! - Discovering the documentation URLs
//! - Extracting each page's content through the renderer
//! - Mapping pages to directories and unique file names
//! - Writing artifacts and recording results
//! - Handling interrupts and closing the renderer

use crate::config::Config;
use crate::crawler::discovery::Discovery;
use crate::crawler::extractor::{ContentExtractor, ExtractError, ExtractedPage};
use crate::crawler::fetcher::build_http_client;
use crate::output::{ArtifactTarget, CrawlSummary, WriteOutcome, WriterCapabilities, WriterDispatcher};
use crate::paths::{sanitize_with, PathBuilder, PlatformPolicy};
use crate::render::{open_renderer, share, RenderError, SharedRenderer};
use crate::state::{CrawlResults, FailureCategory, FailureRecord, PageState};
use crate::DocsError;
use chrono::{DateTime, Local};
use reqwest::Client;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    client: Client,
    renderer: SharedRenderer,
    extractor: ContentExtractor,
    paths: PathBuilder,
    writer: WriterDispatcher,
    results: CrawlResults,
    limit: Option<usize>,
    html_fallbacks: usize,
    summary: Option<CrawlSummary>,
    renderer_closed: bool,
}

impl Coordinator {
    /// Creates a coordinator with the renderer and writer named in the
    /// configuration
    ///
    /// The HTTP client, renderer session and writer strategy are resolved
    /// here, once per run.
    pub async fn new(config: Config) -> Result<Self, DocsError> {
        let timeout = config.crawler.page_load_timeout();
        let client = build_http_client(&config.user_agent, timeout)?;
        let renderer = share(open_renderer(&config.renderer, client.clone(), timeout).await?);

        let policy = PlatformPolicy::current();
        let capabilities = WriterCapabilities::detect(&config.writer, &policy, &renderer).await;
        let writer = WriterDispatcher::from_capabilities(
            &capabilities,
            renderer.clone(),
            config.output.min_free_space_bytes(),
        );

        Ok(Self::from_parts(config, client, renderer, writer, policy))
    }

    /// Assembles a coordinator from already built collaborators
    pub fn from_parts(
        config: Config,
        client: Client,
        renderer: SharedRenderer,
        writer: WriterDispatcher,
        policy: PlatformPolicy,
    ) -> Self {
        let extractor = ContentExtractor::new(
            renderer.clone(),
            config.retry.policy(),
            config.crawler.page_load_timeout(),
        );
        let paths = PathBuilder::new(&config.output.output_dir, policy);

        Self {
            config: Arc::new(config),
            client,
            renderer,
            extractor,
            paths,
            writer,
            results: CrawlResults::new(),
            limit: None,
            html_fallbacks: 0,
            summary: None,
            renderer_closed: false,
        }
    }

    /// Caps the number of pages processed, on top of `max-pages`
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn results(&self) -> &CrawlResults {
        &self.results
    }

    /// Summary of the last run, also available after an interrupt
    pub fn summary(&self) -> Option<&CrawlSummary> {
        self.summary.as_ref()
    }

    /// Runs discovery and processes every discovered page
    ///
    /// Ctrl-C stops the crawl after the page in progress. The renderer
    /// session is closed before this returns, whatever the outcome.
    pub async fn run(&mut self) -> Result<CrawlSummary, DocsError> {
        self.run_until(wait_for_interrupt()).await
    }

    /// Like [`run`](Self::run), but stops when `shutdown` resolves
    ///
    /// A page already in progress is finished first, so no partial
    /// artifacts are left behind. The run then returns
    /// [`DocsError::Interrupted`] and the partial summary is kept in
    /// [`summary`](Self::summary).
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<CrawlSummary, DocsError>
    where
        F: Future<Output = ()>,
    {
        let outcome = self.crawl(shutdown).await;
        self.close_renderer().await;
        outcome
    }

    async fn crawl<F>(&mut self, shutdown: F) -> Result<CrawlSummary, DocsError>
    where
        F: Future<Output = ()>,
    {
        let started_at = Local::now();
        let start_time = Instant::now();

        let urls = self.discover().await?;
        let total = urls.len();
        tracing::info!("Found {} URLs to process", total);

        let delay = self.config.crawler.politeness_delay();
        tokio::pin!(shutdown);
        let mut interrupted = false;

        for (i, url) in urls.iter().enumerate() {
            if self.results.is_recorded(url) {
                tracing::debug!("Skipping already processed {}", url);
                continue;
            }

            tracing::info!("Processing {}/{}: {}", i + 1, total, url);
            let page = self.process_url(url);
            tokio::pin!(page);
            tokio::select! {
                result = &mut page => result?,
                _ = &mut shutdown => {
                    tracing::warn!("Interrupt received, finishing {}", url);
                    interrupted = true;
                    page.as_mut().await?;
                    break;
                }
            }

            if i + 1 < total && !delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = &mut shutdown => {
                        interrupted = true;
                        break;
                    }
                }
            }
        }

        let mut summary = self.build_summary(started_at, start_time);
        summary.interrupted = interrupted;
        summary.log();
        self.summary = Some(summary.clone());

        if interrupted {
            tracing::warn!("Scraping interrupted by user");
            return Err(DocsError::Interrupted);
        }
        Ok(summary)
    }

    async fn discover(&self) -> Result<Vec<String>, DocsError> {
        let discovery = Discovery::new(&self.config, self.client.clone(), self.renderer.clone());
        let mut urls = discovery.discover().await;

        if urls.is_empty() {
            tracing::error!("No URLs found to scrape");
            return Err(DocsError::NothingToCrawl {
                base_url: self.config.crawler.base_url.clone(),
            });
        }

        let cap = match (self.config.crawler.max_pages, self.limit) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        if let Some(cap) = cap {
            if urls.len() > cap {
                tracing::info!("Limiting run to {} of {} URLs", cap, urls.len());
                urls.truncate(cap);
            }
        }

        Ok(urls)
    }

    /// Processes one URL through extraction, path building and writing
    ///
    /// Page failures are recorded, not returned; the only error is an
    /// illegal state transition.
    async fn process_url(&mut self, url: &str) -> Result<(), DocsError> {
        let state = PageState::Pending;

        let page = match self.extractor.fetch_and_extract(url).await {
            Ok(page) => page,
            Err(e) => {
                let stage = match &e {
                    ExtractError::Render(_) => state,
                    _ => state.transition(PageState::Fetched)?,
                };
                tracing::error!("Error scraping {}: {}", url, e);
                return self.record_failure(url, stage, extract_category(&e), e.to_string());
            }
        };
        let state = state
            .transition(PageState::Fetched)?
            .transition(PageState::Extracted)?;

        let target = self.plan_target(&page).await;
        match self.writer.write(&page.content, &page.title, &target).await {
            WriteOutcome::Primary(path) => {
                state.transition(PageState::Written)?;
                self.results.record_success(url, path);
            }
            WriteOutcome::Fallback { path, reason } => {
                state.transition(PageState::Written)?;
                tracing::debug!("Saved {} as HTML ({})", url, reason);
                self.html_fallbacks += 1;
                self.results.record_success(url, path);
            }
            WriteOutcome::Failed { reason } => {
                return self.record_failure(url, state, FailureCategory::Filesystem, reason);
            }
        }

        Ok(())
    }

    async fn plan_target(&self, page: &ExtractedPage) -> ArtifactTarget {
        let dir = self.paths.build(&page.url).await;
        let policy = self.paths.policy();
        let name = sanitize_with(&page.title, policy.max_filename_len, policy);
        let stem = self.paths.unique_stem(&dir, &name);
        ArtifactTarget::plan(&self.paths, &dir, &stem)
    }

    fn record_failure(
        &mut self,
        url: &str,
        stage: PageState,
        category: FailureCategory,
        reason: String,
    ) -> Result<(), DocsError> {
        stage.transition(PageState::Failed)?;
        self.results.record_failure(FailureRecord {
            url: url.to_string(),
            stage,
            category,
            reason,
        });
        Ok(())
    }

    fn build_summary(&self, started_at: DateTime<Local>, start_time: Instant) -> CrawlSummary {
        CrawlSummary::from_results(
            &self.results,
            started_at,
            start_time.elapsed(),
            PathBuf::from(&self.config.output.output_dir),
            self.html_fallbacks,
        )
    }

    async fn close_renderer(&mut self) {
        if self.renderer_closed {
            return;
        }
        self.renderer_closed = true;

        let mut renderer = self.renderer.lock().await;
        if let Err(e) = renderer.close().await {
            tracing::warn!("Failed to close {} renderer: {}", renderer.name(), e);
        }
    }
}

/// Resolves on Ctrl-C; never resolves when no handler can be installed
async fn wait_for_interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn extract_category(error: &ExtractError) -> FailureCategory {
    match error {
        ExtractError::Render(RenderError::Timeout { .. }) => FailureCategory::Renderer,
        ExtractError::Render(RenderError::Status { .. } | RenderError::Navigation { .. }) => {
            FailureCategory::Network
        }
        ExtractError::Render(_) => FailureCategory::Renderer,
        ExtractError::Rejected(_) | ExtractError::NoContent => FailureCategory::Parsing,
    }
}
