//! Crawl completion summary
//!
//! This module turns the run's result sets into the summary printed at the
//! end of a crawl.

use crate::state::{CrawlResults, FailureCategory};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Summary of one finished (or interrupted) run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub started_at: DateTime<Local>,
    pub duration: Duration,
    pub output_dir: PathBuf,

    /// URLs taken from the discovery queue
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,

    /// Pages saved as HTML because the PDF path failed
    pub html_fallbacks: usize,

    /// Failure counts by category
    pub failures_by_category: BTreeMap<FailureCategory, usize>,

    /// Failed URLs with their reasons, sorted by URL
    pub failed_urls: Vec<(String, String)>,

    pub interrupted: bool,
}

impl CrawlSummary {
    /// Builds the summary from the run's bookkeeping
    pub fn from_results(
        results: &CrawlResults,
        started_at: DateTime<Local>,
        duration: Duration,
        output_dir: PathBuf,
        html_fallbacks: usize,
    ) -> Self {
        let failed_urls = results
            .failures()
            .into_iter()
            .map(|record| (record.url.clone(), record.reason.clone()))
            .collect();

        Self {
            started_at,
            duration,
            output_dir,
            total_processed: results.succeeded_count() + results.failed_count(),
            successful: results.succeeded_count(),
            failed: results.failed_count(),
            html_fallbacks,
            failures_by_category: results.failures_by_category(),
            failed_urls,
            interrupted: false,
        }
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_processed == 0 {
            return 0.0;
        }
        (self.successful as f64 / self.total_processed as f64) * 100.0
    }

    /// Logs the headline numbers
    pub fn log(&self) {
        tracing::info!(
            "Scraping completed. Successfully scraped: {}, Failed: {}",
            self.successful,
            self.failed
        );
        tracing::info!(
            "Processed {} pages in {:.1}s ({:.1}% success)",
            self.total_processed,
            self.duration.as_secs_f64(),
            self.success_rate()
        );
    }

    /// Prints the full summary to stdout
    pub fn print(&self) {
        println!("=== Crawl Summary ===\n");

        println!("Run:");
        println!("  Started: {}", self.started_at.format("%Y-%m-%d %H:%M:%S"));
        println!("  Duration: {:.1}s", self.duration.as_secs_f64());
        println!("  Output: {}", self.output_dir.display());
        if self.interrupted {
            println!("  Interrupted before the queue was finished");
        }
        println!();

        println!("Pages:");
        println!("  Total processed: {}", self.total_processed);
        println!("  Successful: {}", self.successful);
        if self.html_fallbacks > 0 {
            println!("    (saved as HTML: {})", self.html_fallbacks);
        }
        println!("  Failed: {}", self.failed);
        println!();

        if !self.failures_by_category.is_empty() {
            println!("Failures by Category:");
            let mut counts: Vec<_> = self.failures_by_category.iter().collect();
            counts.sort_by(|a, b| b.1.cmp(a.1));
            for (category, count) in counts {
                println!("  {}: {}", category, count);
            }
            println!();
        }

        if !self.failed_urls.is_empty() {
            println!("Failed URLs ({}):", self.failed_urls.len());
            for (url, reason) in &self.failed_urls {
                println!("  - {} ({})", url, reason);
            }
            println!();
        }

        println!(
            "Success Rate: {:.1}% ({} / {} pages)",
            self.success_rate(),
            self.successful,
            self.total_processed
        );
    }
}
