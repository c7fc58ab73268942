//! URL to directory mapping
//!
//! Every page lands in a directory that mirrors its URL path below the
//! output root. Segments are decoded, sanitized and checked for traversal,
//! and the directory part is kept inside the platform's path budget so the
//! final file name always fits.

use crate::crawler::RetryPolicy;
use crate::paths::platform::PlatformPolicy;
use crate::paths::sanitize::sanitize_with;
use crate::paths::PathError;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use url::Url;

/// Directory used when a URL cannot be mapped or its directory cannot be created
pub const FALLBACK_DIR: &str = "unknown_structure";

/// Numbered duplicate suffixes tried before switching to a timestamp
pub const MAX_DUPLICATE_SUFFIX: u32 = 10;

/// Extensions a page may already occupy on disk
const ARTIFACT_EXTENSIONS: &[&str] = &["pdf", "html"];

/// Marker appended to an artifact's name while it is being written
const TEMP_MARKER: &str = ".tmp";

/// Builds destination directories and file names under an output root
#[derive(Debug, Clone)]
pub struct PathBuilder {
    base_dir: PathBuf,
    policy: PlatformPolicy,
    retry: RetryPolicy,
}

impl PathBuilder {
    pub fn new(base_dir: impl Into<PathBuf>, policy: PlatformPolicy) -> Self {
        Self {
            base_dir: base_dir.into(),
            policy,
            retry: RetryPolicy::filesystem(),
        }
    }

    /// Overrides the retry policy used for directory creation
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn policy(&self) -> &PlatformPolicy {
        &self.policy
    }

    pub fn fallback_dir(&self) -> PathBuf {
        self.base_dir.join(FALLBACK_DIR)
    }

    /// Computes the directory for `url` without touching the filesystem
    ///
    /// # Rules
    ///
    /// - Empty segments are skipped and a final segment containing `.` is
    ///   treated as a file name and dropped
    /// - Each segment is percent-decoded (raw on failure), sanitized with the
    ///   directory bound, and stripped of `..` and leading dots
    /// - When a segment would push the path past the directory budget it is
    ///   cut to the remaining room and no deeper segments are added
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Directory below the output root
    /// * `Err(PathError)` - The URL could not be parsed or has no path
    pub fn plan(&self, url: &str) -> Result<PathBuf, PathError> {
        let parsed = Url::parse(url)?;
        if parsed.cannot_be_a_base() {
            return Err(PathError::NoPath(url.to_string()));
        }

        let mut segments: Vec<&str> = parsed.path().split('/').filter(|s| !s.is_empty()).collect();
        if segments.last().is_some_and(|last| last.contains('.')) {
            segments.pop();
        }

        let budget = self.policy.directory_budget();
        let mut path = self.base_dir.clone();

        for raw in segments {
            let decoded = urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw));
            let segment = self.clean_segment(&decoded);
            if segment.is_empty() {
                continue;
            }

            let used = path_len(&path) + 1;
            if used + segment.chars().count() > budget {
                let remaining = budget.saturating_sub(used);
                let truncated: String = segment.chars().take(remaining).collect();
                let truncated = truncated.trim_end_matches(['.', '_']);
                if !truncated.is_empty() && !self.policy.is_reserved(truncated) {
                    path.push(truncated);
                }
                break;
            }

            path.push(segment);
        }

        Ok(path)
    }

    fn clean_segment(&self, decoded: &str) -> String {
        let mut segment = sanitize_with(decoded, self.policy.max_dir_segment_len, &self.policy);
        if segment.contains("..") || segment.starts_with('.') {
            segment = segment.replace("..", "_").trim_start_matches('.').to_string();
        }
        segment
    }

    /// Maps `url` to a directory and creates it
    ///
    /// Never fails: unmappable URLs go to `unknown_structure`, and when the
    /// planned directory cannot be created after retries the builder falls
    /// back to `unknown_structure` and then to the output root itself.
    pub async fn build(&self, url: &str) -> PathBuf {
        let planned = match self.plan(url) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Cannot map {} to a directory ({}), using {}", url, e, FALLBACK_DIR);
                self.fallback_dir()
            }
        };

        if self.create_dir(&planned).await {
            return planned;
        }

        let fallback = self.fallback_dir();
        if planned != fallback && self.create_dir(&fallback).await {
            return fallback;
        }

        if !self.create_dir(&self.base_dir).await {
            tracing::error!("Output directory {} is not writable", self.base_dir.display());
        }
        self.base_dir.clone()
    }

    async fn create_dir(&self, dir: &Path) -> bool {
        let result = self
            .retry
            .run("create_dir", |_: &std::io::Error| true, |_| tokio::fs::create_dir_all(dir))
            .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to create directory {}: {}", dir.display(), e);
                false
            }
        }
    }

    /// Joins `stem.extension` onto `dir`, shortening the stem if the full
    /// path would exceed the platform bound
    ///
    /// Room for a `.tmp` marker is kept so the temporary file also fits.
    /// Stems returned by [`unique_stem`](Self::unique_stem) are never
    /// shortened here.
    pub fn file_path(&self, dir: &Path, stem: &str, extension: &str) -> PathBuf {
        // separator, dot, extension and temp marker
        let fixed = path_len(dir) + 2 + extension.len() + TEMP_MARKER.len();
        let available = self.policy.max_path_len.saturating_sub(fixed).max(1);
        dir.join(format!("{}.{}", shorten(stem, available), extension))
    }

    /// Characters left for a stem in `dir`, whatever the artifact extension
    fn stem_room(&self, dir: &Path) -> usize {
        let longest = ARTIFACT_EXTENSIONS.iter().map(|ext| ext.len()).max().unwrap_or(0);
        let fixed = path_len(dir) + 2 + longest + TEMP_MARKER.len();
        self.policy.max_path_len.saturating_sub(fixed).max(1)
    }

    /// Picks a stem not yet used by any artifact in `dir`
    ///
    /// `stem`, then `stem_1` through `stem_10`, then `stem_<timestamp>`. A stem
    /// is taken when either its `.pdf` or its `.html` file exists. Every
    /// candidate is first shortened to fit `dir`, keeping its suffix, so the
    /// name checked is the name written.
    pub fn unique_stem(&self, dir: &Path, stem: &str) -> String {
        let room = self.stem_room(dir);
        let base = shorten(stem, room);
        if !is_taken(dir, &base) {
            return base;
        }

        for n in 1..=MAX_DUPLICATE_SUFFIX {
            let candidate = with_suffix(&base, &format!("_{}", n), room);
            if !is_taken(dir, &candidate) {
                return candidate;
            }
        }

        let stamp = format!("_{}", chrono::Local::now().format("%Y%m%d_%H%M%S_%6f"));
        let stamped = with_suffix(&base, &stamp, room);
        tracing::debug!("Duplicate suffixes exhausted for {}, using {}", base, stamped);
        stamped
    }
}

/// Cuts `stem` to `room` characters, dropping a trailing `.` or `_` the cut
/// exposes
fn shorten(stem: &str, room: usize) -> String {
    if stem.chars().count() <= room {
        return stem.to_string();
    }
    let truncated: String = stem.chars().take(room).collect();
    let trimmed = truncated.trim_end_matches(['.', '_']);
    if trimmed.is_empty() {
        truncated
    } else {
        trimmed.to_string()
    }
}

/// Appends `suffix`, shortening `base` so the whole stem fits in `room`
fn with_suffix(base: &str, suffix: &str, room: usize) -> String {
    let keep = room.saturating_sub(suffix.chars().count()).max(1);
    format!("{}{}", shorten(base, keep), suffix)
}

fn is_taken(dir: &Path, stem: &str) -> bool {
    ARTIFACT_EXTENSIONS
        .iter()
        .any(|ext| dir.join(format!("{}.{}", stem, ext)).exists())
}

fn path_len(path: &Path) -> usize {
    path.to_string_lossy().chars().count()
}
