//! Per-run bookkeeping of succeeded and failed URLs

use crate::state::PageState;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

/// Broad classification of a failure, used in the summary breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureCategory {
    Network,
    Renderer,
    Parsing,
    Filesystem,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Renderer => "renderer",
            Self::Parsing => "parsing",
            Self::Filesystem => "filesystem",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why one URL failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub url: String,
    /// State the page was in when it failed
    pub stage: PageState,
    pub category: FailureCategory,
    pub reason: String,
}

/// Succeeded and failed URL sets for one run
///
/// The two sets are disjoint and append-only: once a URL is recorded in
/// either set, later records for it are ignored.
#[derive(Debug, Default)]
pub struct CrawlResults {
    succeeded: HashSet<String>,
    failed: HashMap<String, FailureRecord>,
    artifacts: HashMap<String, PathBuf>,
}

impl CrawlResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_succeeded(&self, url: &str) -> bool {
        self.succeeded.contains(url)
    }

    pub fn is_failed(&self, url: &str) -> bool {
        self.failed.contains_key(url)
    }

    /// Whether `url` already has an outcome in this run
    pub fn is_recorded(&self, url: &str) -> bool {
        self.is_succeeded(url) || self.is_failed(url)
    }

    /// Records a written page and where its artifact landed
    ///
    /// Returns false, leaving the results untouched, when the URL already
    /// has an outcome.
    pub fn record_success(&mut self, url: &str, artifact: PathBuf) -> bool {
        if self.is_recorded(url) {
            tracing::warn!("Ignoring second outcome for {}", url);
            return false;
        }
        self.succeeded.insert(url.to_string());
        self.artifacts.insert(url.to_string(), artifact);
        true
    }

    /// Records a failure; returns false when the URL already has an outcome
    pub fn record_failure(&mut self, record: FailureRecord) -> bool {
        if self.is_recorded(&record.url) {
            tracing::warn!("Ignoring second outcome for {}", record.url);
            return false;
        }
        self.failed.insert(record.url.clone(), record);
        true
    }

    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn artifact(&self, url: &str) -> Option<&PathBuf> {
        self.artifacts.get(url)
    }

    /// Failure records sorted by URL
    pub fn failures(&self) -> Vec<&FailureRecord> {
        let mut records: Vec<_> = self.failed.values().collect();
        records.sort_by(|a, b| a.url.cmp(&b.url));
        records
    }

    /// Failure counts per category
    pub fn failures_by_category(&self) -> BTreeMap<FailureCategory, usize> {
        let mut counts = BTreeMap::new();
        for record in self.failed.values() {
            *counts.entry(record.category).or_insert(0) += 1;
        }
        counts
    }
}
