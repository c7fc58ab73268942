//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: lifecycle of one page (pending, fetched, extracted, written, failed)
//! - `CrawlResults`: the run's succeeded and failed URL sets with failure reasons

mod page_state;
mod results;

// Re-export main types
pub use page_state::PageState;
pub use results::{CrawlResults, FailureCategory, FailureRecord};
