//! doc-mirror: a documentation-site mirror
//!
//! This crate discovers the pages of a documentation site (sitemap first,
//! navigation links as a last resort), extracts the main content of each
//! page through a page renderer, and writes every page as a PDF (or an HTML
//! fallback) under a directory tree that mirrors the site's URL structure.

pub mod config;
pub mod crawler;
pub mod output;
pub mod paths;
pub mod render;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for doc-mirror operations
#[derive(Debug, Error)]
pub enum DocsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Renderer error: {0}")]
    Render(#[from] render::RenderError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::PageState,
        to: state::PageState,
    },

    #[error("No documentation URLs discovered for {base_url}")]
    NothingToCrawl { base_url: String },

    #[error("Crawl interrupted by user")]
    Interrupted,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for doc-mirror operations
pub type Result<T> = std::result::Result<T, DocsError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, RetryPolicy};
pub use output::{CrawlSummary, WriteOutcome};
pub use paths::{sanitize, PathBuilder, PlatformPolicy};
pub use state::{CrawlResults, PageState};
