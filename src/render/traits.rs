use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors raised by a page renderer
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Timed out after {timeout:?} loading {url}")]
    Timeout { url: String, timeout: Duration },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid CSS selector: {0}")]
    Selector(String),

    #[error("No page has been loaded")]
    NoPage,

    #[error("{renderer} renderer does not support {operation}")]
    Unsupported {
        renderer: &'static str,
        operation: &'static str,
    },

    #[error("Renderer session is closed")]
    Closed,

    #[error("Renderer failure: {0}")]
    Other(String),
}

impl RenderError {
    /// Returns true for failures that may clear up on a fresh attempt
    ///
    /// | Condition | Transient |
    /// |-----------|-----------|
    /// | Timeout | yes |
    /// | Navigation/transport failure | yes |
    /// | HTTP 408, 429, 5xx | yes |
    /// | Other HTTP status | no |
    /// | Selector, unsupported, closed | no |
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Navigation { .. } => true,
            Self::Status { status, .. } => {
                *status == 408 || *status == 429 || (500..600).contains(status)
            }
            _ => false,
        }
    }
}

/// A DOM element reduced to what link discovery needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub tag: String,
    /// Absolute `href`, when the element has one
    pub href: Option<String>,
    pub text: String,
}

/// Page settings for print-to-PDF
#[derive(Debug, Clone)]
pub struct PdfOptions {
    pub paper_width_in: f64,
    pub paper_height_in: f64,
    pub margin_in: f64,
    pub print_background: bool,
}

impl Default for PdfOptions {
    /// US Letter with one-inch margins
    fn default() -> Self {
        Self {
            paper_width_in: 8.5,
            paper_height_in: 11.0,
            margin_in: 1.0,
            print_background: true,
        }
    }
}

/// A session that turns URLs into rendered markup
///
/// One session is owned by the crawl for its whole lifetime and is used for
/// one page at a time. `close` must be called exactly once.
#[async_trait]
pub trait PageRenderer: Send {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Loads `url` and returns the markup as first delivered
    async fn navigate(&mut self, url: &str) -> Result<String, RenderError>;

    /// Waits until the current document reports ready
    async fn wait_for_ready(&mut self, timeout: Duration) -> Result<(), RenderError>;

    /// Markup of the current document as it stands now
    async fn page_source(&mut self) -> Result<String, RenderError>;

    /// Elements of the current document matching a CSS selector
    async fn find_elements(&mut self, selector: &str) -> Result<Vec<ElementHandle>, RenderError>;

    fn supports_pdf(&self) -> bool {
        false
    }

    /// Renders a standalone HTML document to PDF bytes
    async fn print_to_pdf(
        &mut self,
        _html: &str,
        _options: &PdfOptions,
    ) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Unsupported {
            renderer: self.name(),
            operation: "print-to-PDF",
        })
    }

    /// Ends the session; later calls fail with [`RenderError::Closed`]
    async fn close(&mut self) -> Result<(), RenderError>;
}

/// The crawl's single renderer session, shared between discovery, extraction
/// and the PDF writer
pub type SharedRenderer = Arc<Mutex<Box<dyn PageRenderer>>>;

pub fn share(renderer: Box<dyn PageRenderer>) -> SharedRenderer {
    Arc::new(Mutex::new(renderer))
}
