//! Document writer traits and errors

use async_trait::async_trait;
use std::io;
use thiserror::Error;

/// Errors that can occur while producing an artifact
#[derive(Debug, Error)]
pub enum WriterError {
    /// The external tool is missing from this machine
    #[error("{tool} is not installed")]
    NotInstalled { tool: String },

    /// The tool or renderer ran but produced no usable document
    #[error("PDF rendering failed: {0}")]
    RenderFailed(String),

    #[error("Insufficient disk space: {available} bytes free, {required} required")]
    InsufficientSpace { available: u64, required: u64 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl WriterError {
    /// Filesystem hiccups (locked files, interrupted calls) are worth a
    /// short retry; everything else falls through to the HTML fallback
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::Interrupted
                    | io::ErrorKind::WouldBlock
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::PermissionDenied
            ),
            _ => false,
        }
    }
}

/// Result type for writer operations
pub type WriterResult<T> = Result<T, WriterError>;

/// Turns a standalone HTML document into PDF bytes
#[async_trait]
pub trait DocumentWriter: Send + Sync {
    /// Short name used in logs and the preflight report
    fn name(&self) -> &'static str;

    async fn render(&self, html: &str) -> WriterResult<Vec<u8>>;
}
