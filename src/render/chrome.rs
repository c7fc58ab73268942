//! Headless Chromium renderer (requires the `chrome` feature)

use crate::render::traits::{ElementHandle, PageRenderer, PdfOptions, RenderError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Renderer driving one Chromium tab through the DevTools protocol
pub struct ChromeRenderer {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    page: Option<Page>,
    timeout: Duration,
}

impl ChromeRenderer {
    /// Launches Chromium and opens a blank tab
    ///
    /// # Arguments
    ///
    /// * `headless` - Run without a visible window
    /// * `timeout` - Page-load timeout applied to navigation and waits
    pub async fn launch(headless: bool, timeout: Duration) -> Result<Self, RenderError> {
        let mut builder = BrowserConfig::builder().request_timeout(timeout);
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(RenderError::Other)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Other(format!("Failed to launch Chromium: {}", e)))?;

        // the CDP connection only makes progress while its handler is polled
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Other(format!("Failed to open tab: {}", e)))?;

        tracing::info!("Chromium session started (headless: {})", headless);

        Ok(Self {
            browser: Some(browser),
            handler: Some(handler),
            page: Some(page),
            timeout,
        })
    }

    fn page(&self) -> Result<&Page, RenderError> {
        self.page.as_ref().ok_or(RenderError::Closed)
    }

    async fn bounded<T, F>(&self, url: &str, fut: F) -> Result<T, RenderError>
    where
        F: Future<Output = Result<T, chromiumoxide::error::CdpError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(RenderError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(RenderError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }),
        }
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    fn name(&self) -> &'static str {
        "chrome"
    }

    async fn navigate(&mut self, url: &str) -> Result<String, RenderError> {
        let page = self.page()?;
        self.bounded(url, async { page.goto(url).await.map(|_| ()) })
            .await?;
        self.bounded(url, page.content()).await
    }

    async fn wait_for_ready(&mut self, timeout: Duration) -> Result<(), RenderError> {
        let page = self.page()?;
        let url = page.url().await.ok().flatten().unwrap_or_default();
        match tokio::time::timeout(timeout, page.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(RenderError::Navigation {
                url,
                reason: e.to_string(),
            }),
            Err(_) => Err(RenderError::Timeout { url, timeout }),
        }
    }

    async fn page_source(&mut self) -> Result<String, RenderError> {
        let page = self.page()?;
        page.content()
            .await
            .map_err(|e| RenderError::Other(e.to_string()))
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementHandle>, RenderError> {
        let page = self.page()?;
        let elements = page
            .find_elements(selector)
            .await
            .map_err(|e| RenderError::Selector(format!("{} ({})", selector, e)))?;

        let mut handles = Vec::with_capacity(elements.len());
        for element in elements {
            // `href` as a property is already absolute, unlike the attribute
            let href = element
                .property("href")
                .await
                .ok()
                .flatten()
                .and_then(|value| value.as_str().map(str::to_string));
            let tag = element
                .property("tagName")
                .await
                .ok()
                .flatten()
                .and_then(|value| value.as_str().map(str::to_lowercase))
                .unwrap_or_default();
            let text = element.inner_text().await.ok().flatten().unwrap_or_default();
            handles.push(ElementHandle {
                tag,
                href,
                text: text.trim().to_string(),
            });
        }
        Ok(handles)
    }

    fn supports_pdf(&self) -> bool {
        true
    }

    async fn print_to_pdf(
        &mut self,
        html: &str,
        options: &PdfOptions,
    ) -> Result<Vec<u8>, RenderError> {
        let page = self.page()?;
        page.set_content(html)
            .await
            .map_err(|e| RenderError::Other(format!("Failed to load document: {}", e)))?;

        let params = PrintToPdfParams {
            print_background: Some(options.print_background),
            paper_width: Some(options.paper_width_in),
            paper_height: Some(options.paper_height_in),
            margin_top: Some(options.margin_in),
            margin_bottom: Some(options.margin_in),
            margin_left: Some(options.margin_in),
            margin_right: Some(options.margin_in),
            ..Default::default()
        };

        page.pdf(params)
            .await
            .map_err(|e| RenderError::Other(format!("Print to PDF failed: {}", e)))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.page = None;
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };

        let result = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| RenderError::Other(format!("Failed to close Chromium: {}", e)));
        if let Err(e) = browser.wait().await {
            tracing::debug!("Chromium did not exit cleanly: {}", e);
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        tracing::info!("Chromium session closed");
        result
    }
}
