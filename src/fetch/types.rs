//! Fetch types
//!
//! The page fetcher seam and the values flowing out of a fetch batch.

use crate::error::{FetchError, Result};
use crate::pagination::PageRequest;
use crate::types::Method;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Performs the network calls for a single environment run
///
/// Implemented by [`crate::http::HttpClient`]; tests substitute in-memory fakes.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Issue the initial query that returns the first page and its `nextPage` link
    async fn query_first_page(
        &self,
        token: &str,
        method: Method,
        url: &str,
        body: &Value,
    ) -> Result<Value>;

    /// GET one generated page
    async fn fetch_page(&self, token: &str, url: &str) -> std::result::Result<Value, FetchError>;
}

/// Raw body of a successfully fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// Request that produced the body
    pub request: PageRequest,
    /// Decoded JSON body
    pub body: Value,
}

/// Outcome of one page fetch
pub type PageResult = std::result::Result<FetchedPage, FetchError>;

/// Completion count reported while a batch runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchProgress {
    /// Pages finished so far, successful or not
    pub completed: usize,
    /// Pages that failed so far
    pub failed: usize,
    /// Pages in the batch
    pub total: usize,
}

impl FetchProgress {
    /// Whether every page has been accounted for
    pub fn is_finished(&self) -> bool {
        self.completed >= self.total
    }
}

/// Callback invoked from the collector as each page completes
pub type ProgressCallback = Arc<dyn Fn(FetchProgress) + Send + Sync>;

/// Everything a fetch batch produced, in completion order
#[derive(Debug, Default)]
pub struct FetchBatch {
    /// One entry per completed page
    pub results: Vec<PageResult>,
    /// Number of pages submitted
    pub total: usize,
    /// Whether the batch was cut short by cancellation
    pub cancelled: bool,
}

impl FetchBatch {
    /// Number of successful pages
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    /// Number of failed pages
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.is_err()).count()
    }

    /// Pages that never produced a result (cancelled or lost to a worker panic)
    pub fn missing(&self) -> usize {
        self.total.saturating_sub(self.results.len())
    }
}
