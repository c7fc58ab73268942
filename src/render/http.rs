//! Plain HTTP renderer
//!
//! Fetches pages with reqwest and answers selector queries with scraper.
//! No JavaScript runs, so "ready" simply means a body was received.

use crate::crawler::resolve_link;
use crate::render::traits::{ElementHandle, PageRenderer, RenderError};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

#[derive(Debug)]
struct LoadedPage {
    url: Url,
    markup: String,
}

/// Renderer backed by a reqwest client
pub struct HttpRenderer {
    client: Client,
    timeout: Duration,
    current: Option<LoadedPage>,
    closed: bool,
}

impl HttpRenderer {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            current: None,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), RenderError> {
        if self.closed {
            Err(RenderError::Closed)
        } else {
            Ok(())
        }
    }

    fn loaded(&self) -> Result<&LoadedPage, RenderError> {
        self.ensure_open()?;
        self.current.as_ref().ok_or(RenderError::NoPage)
    }

    fn transport_error(&self, url: &str, error: reqwest::Error) -> RenderError {
        if error.is_timeout() {
            RenderError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            RenderError::Navigation {
                url: url.to_string(),
                reason: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn navigate(&mut self, url: &str) -> Result<String, RenderError> {
        self.ensure_open()?;
        self.current = None;

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let markup = response
            .text()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        self.current = Some(LoadedPage {
            url: final_url,
            markup: markup.clone(),
        });
        Ok(markup)
    }

    async fn wait_for_ready(&mut self, _timeout: Duration) -> Result<(), RenderError> {
        self.loaded().map(|_| ())
    }

    async fn page_source(&mut self) -> Result<String, RenderError> {
        self.loaded().map(|page| page.markup.clone())
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementHandle>, RenderError> {
        let page = self.loaded()?;
        select_elements(&page.markup, &page.url, selector)
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.closed = true;
        self.current = None;
        Ok(())
    }
}

/// Runs `selector` against `markup`, resolving hrefs against `base`
pub(crate) fn select_elements(
    markup: &str,
    base: &Url,
    selector: &str,
) -> Result<Vec<ElementHandle>, RenderError> {
    let parsed = Selector::parse(selector)
        .map_err(|e| RenderError::Selector(format!("{} ({:?})", selector, e)))?;
    let document = Html::parse_document(markup);

    Ok(document
        .select(&parsed)
        .map(|element| ElementHandle {
            tag: element.value().name().to_string(),
            href: element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base)),
            text: element.text().collect::<String>().trim().to_string(),
        })
        .collect())
}
