//! Output module for writing page artifacts and crawl reports
//!
//! This module handles:
//! - Wrapping extracted content in a styled HTML document
//! - Producing PDFs (native tool or renderer print) with an HTML fallback
//! - Summaries and the environment check

mod native;
mod preflight;
pub mod stats;
mod template;
mod traits;
mod writer;

pub use native::{RendererPdfWriter, WkhtmltopdfWriter};
pub use preflight::PreflightReport;
pub use stats::CrawlSummary;
pub use template::wrap_document;
pub use traits::{DocumentWriter, WriterError, WriterResult};
pub use writer::{
    resolve_strategy, temp_path, write_atomic, ArtifactTarget, WriteOutcome, WriterCapabilities,
    WriterDispatcher, WriterStrategy,
};
