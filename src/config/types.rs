use crate::crawler::RetryPolicy;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for doc-mirror
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub writer: WriterConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Root URL of the documentation site (scheme and host, optionally a path)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path prefix shared by every documentation page (e.g. "/5.3/en-US/")
    #[serde(rename = "docs-path", default = "default_docs_path")]
    pub docs_path: String,

    /// Fixed delay between successive pages (milliseconds)
    #[serde(rename = "politeness-delay-ms", default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,

    /// Page-load timeout for the renderer and HTTP client (seconds)
    #[serde(
        rename = "page-load-timeout-secs",
        default = "default_page_load_timeout_secs"
    )]
    pub page_load_timeout_secs: u64,

    /// Upper bound on the number of pages processed in one run
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<usize>,
}

impl CrawlerConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }
}

/// Sitemap discovery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Sitemap location relative to the base URL
    #[serde(rename = "sitemap-path", default = "default_sitemap_path")]
    pub sitemap_path: String,

    /// How many levels of sitemap indexes are followed
    #[serde(rename = "max-sitemap-depth", default = "default_max_sitemap_depth")]
    pub max_sitemap_depth: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            sitemap_path: default_sitemap_path(),
            max_sitemap_depth: default_max_sitemap_depth(),
        }
    }
}

/// Retry/backoff configuration shared by every network and renderer call
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Attempts per operation, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(rename = "base-delay-ms", default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound for any single backoff delay (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl RetryConfig {
    /// Builds the retry policy described by this section
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root of the mirrored directory tree
    #[serde(rename = "output-dir")]
    pub output_dir: String,

    /// Minimum free space required before writing a PDF (mebibytes)
    #[serde(rename = "min-free-space-mb", default = "default_min_free_space_mb")]
    pub min_free_space_mb: u64,
}

impl OutputConfig {
    pub fn min_free_space_bytes(&self) -> u64 {
        self.min_free_space_mb.saturating_mul(1024 * 1024)
    }
}

/// Which page renderer drives navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Plain HTTP fetches parsed with scraper
    Http,
    /// Headless Chromium (requires the `chrome` feature)
    Chrome,
}

/// Page renderer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RendererConfig {
    #[serde(default = "default_renderer_kind")]
    pub kind: RendererKind,

    #[serde(default = "default_headless")]
    pub headless: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            kind: default_renderer_kind(),
            headless: default_headless(),
        }
    }
}

/// Requested PDF writer strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriterStrategyConfig {
    /// Pick the best available writer for the platform
    Auto,
    /// Native PDF tool only (wkhtmltopdf)
    Native,
    /// Renderer print-to-PDF only
    Renderer,
    /// Never produce PDFs, always write HTML
    Html,
}

/// Document writer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WriterConfig {
    #[serde(default = "default_writer_strategy")]
    pub strategy: WriterStrategyConfig,

    /// Binary used for native PDF rendering
    #[serde(rename = "wkhtmltopdf-path", default = "default_wkhtmltopdf_path")]
    pub wkhtmltopdf_path: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            strategy: default_writer_strategy(),
            wkhtmltopdf_path: default_wkhtmltopdf_path(),
        }
    }
}

fn default_docs_path() -> String {
    "/".to_string()
}

fn default_politeness_delay_ms() -> u64 {
    1000
}

fn default_page_load_timeout_secs() -> u64 {
    30
}

fn default_sitemap_path() -> String {
    "sitemap.xml".to_string()
}

fn default_max_sitemap_depth() -> usize {
    2
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    32_000
}

fn default_crawler_name() -> String {
    "doc-mirror".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_min_free_space_mb() -> u64 {
    50
}

fn default_renderer_kind() -> RendererKind {
    RendererKind::Http
}

fn default_headless() -> bool {
    true
}

fn default_writer_strategy() -> WriterStrategyConfig {
    WriterStrategyConfig::Auto
}

fn default_wkhtmltopdf_path() -> String {
    "wkhtmltopdf".to_string()
}
