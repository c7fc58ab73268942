//! Document writer dispatch
//!
//! This module decides once, at startup, how PDFs are produced and then
//! writes every page through that strategy:
//! - Free-space check before any PDF is attempted
//! - Atomic writes (`<final>.tmp` then rename)
//! - HTML fallback with the same base name when the PDF path fails

use crate::config::{WriterConfig, WriterStrategyConfig};
use crate::crawler::RetryPolicy;
use crate::output::native::{RendererPdfWriter, WkhtmltopdfWriter};
use crate::output::template::wrap_document;
use crate::output::traits::{DocumentWriter, WriterError, WriterResult};
use crate::paths::{PathBuilder, PlatformPolicy, WriterPreference};
use crate::render::SharedRenderer;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// How PDFs are produced for this run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterStrategy {
    /// Pipe through the native tool
    Native,
    /// Use the renderer's print-to-PDF
    Renderer,
    /// No PDF writer; every page is written as HTML
    HtmlOnly,
}

impl fmt::Display for WriterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Native => "native",
            Self::Renderer => "renderer",
            Self::HtmlOnly => "html-only",
        };
        write!(f, "{}", name)
    }
}

/// Picks the strategy from the request and what is available
///
/// `auto` follows the platform preference and falls back to the other PDF
/// path before giving up on PDFs. An explicit request that cannot be met
/// degrades to HTML only.
pub fn resolve_strategy(
    requested: WriterStrategyConfig,
    preference: WriterPreference,
    native_available: bool,
    renderer_pdf: bool,
) -> WriterStrategy {
    let native = native_available.then_some(WriterStrategy::Native);
    let renderer = renderer_pdf.then_some(WriterStrategy::Renderer);

    let chosen = match requested {
        WriterStrategyConfig::Html => None,
        WriterStrategyConfig::Native => native,
        WriterStrategyConfig::Renderer => renderer,
        WriterStrategyConfig::Auto => match preference {
            WriterPreference::Native => native.or(renderer),
            WriterPreference::Renderer => renderer.or(native),
        },
    };

    chosen.unwrap_or(WriterStrategy::HtmlOnly)
}

/// Writer availability, resolved once per run
#[derive(Debug, Clone)]
pub struct WriterCapabilities {
    pub strategy: WriterStrategy,
    /// The native tool, when it answered a probe
    pub native: Option<WkhtmltopdfWriter>,
    pub renderer_pdf: bool,
}

impl WriterCapabilities {
    /// Probes the native tool and the renderer, then resolves the strategy
    pub async fn detect(
        config: &WriterConfig,
        policy: &PlatformPolicy,
        renderer: &SharedRenderer,
    ) -> Self {
        let renderer_pdf = renderer.lock().await.supports_pdf();

        let native = if config.strategy == WriterStrategyConfig::Html {
            None
        } else {
            match WkhtmltopdfWriter::probe(&config.wkhtmltopdf_path).await {
                Ok(writer) => Some(writer),
                Err(e) => {
                    tracing::debug!("Native PDF tool unavailable: {}", e);
                    None
                }
            }
        };

        let strategy = resolve_strategy(
            config.strategy,
            policy.preferred_writer,
            native.is_some(),
            renderer_pdf,
        );

        if strategy == WriterStrategy::HtmlOnly && config.strategy != WriterStrategyConfig::Html {
            tracing::warn!("No PDF writer available, pages will be saved as HTML");
        } else {
            tracing::info!("Using {} PDF writer", strategy);
        }

        Self {
            strategy,
            native,
            renderer_pdf,
        }
    }
}

/// Where one page's artifact may land
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactTarget {
    pub pdf: PathBuf,
    pub html: PathBuf,
}

impl ArtifactTarget {
    /// Fits `stem` into `dir` so both the PDF and the HTML name stay within
    /// the platform's path bound
    pub fn plan(builder: &PathBuilder, dir: &Path, stem: &str) -> Self {
        let html = builder.file_path(dir, stem, "html");
        let pdf = html.with_extension("pdf");
        Self { pdf, html }
    }
}

/// Result of writing one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The PDF was written
    Primary(PathBuf),
    /// The HTML fallback was written instead
    Fallback { path: PathBuf, reason: String },
    /// Neither artifact could be written
    Failed { reason: String },
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Primary(path) | Self::Fallback { path, .. } => Some(path),
            Self::Failed { .. } => None,
        }
    }
}

/// Writes pages through the resolved strategy with an HTML fallback
pub struct WriterDispatcher {
    primary: Option<Box<dyn DocumentWriter>>,
    min_free_space: u64,
    retry: RetryPolicy,
}

impl WriterDispatcher {
    pub fn new(primary: Option<Box<dyn DocumentWriter>>, min_free_space: u64) -> Self {
        Self {
            primary,
            min_free_space,
            retry: RetryPolicy::filesystem(),
        }
    }

    pub fn from_capabilities(
        capabilities: &WriterCapabilities,
        renderer: SharedRenderer,
        min_free_space: u64,
    ) -> Self {
        let primary: Option<Box<dyn DocumentWriter>> = match capabilities.strategy {
            WriterStrategy::Native => capabilities
                .native
                .clone()
                .map(|writer| Box::new(writer) as Box<dyn DocumentWriter>),
            WriterStrategy::Renderer => Some(Box::new(RendererPdfWriter::new(renderer))),
            WriterStrategy::HtmlOnly => None,
        };
        Self::new(primary, min_free_space)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn primary_name(&self) -> Option<&'static str> {
        self.primary.as_ref().map(|writer| writer.name())
    }

    /// Wraps `content` in the page template and writes it to `target`
    ///
    /// Never returns an error: a failed PDF falls back to HTML, and only a
    /// failed fallback yields [`WriteOutcome::Failed`].
    pub async fn write(&self, content: &str, title: &str, target: &ArtifactTarget) -> WriteOutcome {
        let document = wrap_document(title, content);

        let reason = match &self.primary {
            Some(writer) => match self.write_pdf(writer.as_ref(), &document, &target.pdf).await {
                Ok(()) => {
                    tracing::info!("Saved: {}", target.pdf.display());
                    return WriteOutcome::Primary(target.pdf.clone());
                }
                Err(e) => {
                    tracing::warn!(
                        "{} failed for {}: {}, saving HTML instead",
                        writer.name(),
                        target.pdf.display(),
                        e
                    );
                    e.to_string()
                }
            },
            None => "no PDF writer available".to_string(),
        };

        match self.write_file(&target.html, document.as_bytes()).await {
            Ok(()) => {
                tracing::info!("Saved HTML: {}", target.html.display());
                WriteOutcome::Fallback {
                    path: target.html.clone(),
                    reason,
                }
            }
            Err(e) => {
                tracing::error!("Failed to write {}: {}", target.html.display(), e);
                WriteOutcome::Failed {
                    reason: format!("{}; HTML fallback failed: {}", reason, e),
                }
            }
        }
    }

    async fn write_pdf(
        &self,
        writer: &dyn DocumentWriter,
        document: &str,
        path: &Path,
    ) -> WriterResult<()> {
        self.check_free_space(path)?;
        let bytes = writer.render(document).await?;
        self.write_file(path, &bytes).await
    }

    fn check_free_space(&self, path: &Path) -> WriterResult<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        match fs2::available_space(dir) {
            Ok(available) if available < self.min_free_space => Err(WriterError::InsufficientSpace {
                available,
                required: self.min_free_space,
            }),
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::debug!("Could not read free space for {}: {}", dir.display(), e);
                Ok(())
            }
        }
    }

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> WriterResult<()> {
        self.retry
            .run("write_file", WriterError::is_retryable, |_| write_atomic(path, bytes))
            .await
    }
}

/// Path of the temporary file used while writing `path`
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Writes `bytes` to `<path>.tmp` and renames it over `path`
///
/// The temporary file is removed on any failure, so `path` either holds
/// the complete artifact or is left untouched.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> WriterResult<()> {
    let tmp = temp_path(path);

    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        tokio::fs::remove_file(&tmp).await.ok();
        return Err(WriterError::Io(e));
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        tokio::fs::remove_file(&tmp).await.ok();
        return Err(WriterError::Io(e));
    }
    Ok(())
}
