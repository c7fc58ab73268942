//! Destination paths for mirrored pages
//!
//! This module turns page titles and URLs into filesystem locations:
//! - Name sanitization (illegal characters, reserved names, length bounds)
//! - Platform limits resolved once at startup
//! - URL to directory mapping with traversal defense and duplicate handling

mod builder;
mod platform;
mod sanitize;

pub use builder::{PathBuilder, FALLBACK_DIR, MAX_DUPLICATE_SUFFIX};
pub use platform::{PlatformPolicy, WriterPreference, RESERVED_NAMES};
pub use sanitize::{decode_entities, sanitize, sanitize_with, FALLBACK_NAME, MIN_NAME_LENGTH};

use thiserror::Error;

/// Reasons a URL cannot be mapped onto the output tree
#[derive(Debug, Error)]
pub enum PathError {
    #[error("Failed to parse URL: {0}")]
    Url(#[from] ::url::ParseError),

    #[error("URL has no hierarchical path: {0}")]
    NoPath(String),
}
