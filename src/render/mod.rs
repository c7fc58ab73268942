//! Page renderers
//!
//! A renderer turns a URL into markup and answers selector queries against
//! the loaded page. Two implementations exist:
//! - [`HttpRenderer`]: reqwest + scraper, always available
//! - `ChromeRenderer`: headless Chromium, behind the `chrome` feature

#[cfg(feature = "chrome")]
mod chrome;
mod http;
mod traits;

#[cfg(feature = "chrome")]
pub use chrome::ChromeRenderer;
pub use http::HttpRenderer;
pub use traits::{share, ElementHandle, PageRenderer, PdfOptions, RenderError, SharedRenderer};

use crate::config::{RendererConfig, RendererKind};
use reqwest::Client;
use std::time::Duration;

/// Opens the renderer selected in the configuration
///
/// # Arguments
///
/// * `config` - Renderer section of the configuration
/// * `client` - HTTP client shared with sitemap discovery
/// * `timeout` - Page-load timeout
pub async fn open_renderer(
    config: &RendererConfig,
    client: Client,
    timeout: Duration,
) -> Result<Box<dyn PageRenderer>, RenderError> {
    match config.kind {
        RendererKind::Http => Ok(Box::new(HttpRenderer::new(client, timeout))),
        RendererKind::Chrome => open_chrome(config, timeout).await,
    }
}

#[cfg(feature = "chrome")]
async fn open_chrome(
    config: &RendererConfig,
    timeout: Duration,
) -> Result<Box<dyn PageRenderer>, RenderError> {
    let renderer = ChromeRenderer::launch(config.headless, timeout).await?;
    Ok(Box::new(renderer))
}

#[cfg(not(feature = "chrome"))]
async fn open_chrome(
    _config: &RendererConfig,
    _timeout: Duration,
) -> Result<Box<dyn PageRenderer>, RenderError> {
    Err(RenderError::Other(
        "renderer kind \"chrome\" requires building with the `chrome` feature".to_string(),
    ))
}
