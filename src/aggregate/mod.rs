//! Result aggregation
//!
//! Fan-in half of the export: the first page and every fetched page are
//! merged into a single [`Dataset`], with a [`MergeReport`] that says how
//! many pages succeeded and which ones did not.

mod merge;
mod types;

pub use merge::ResultAggregator;
pub use types::{Dataset, MergeOutcome, MergeReport, PagePayload, Paging, PagingUrls};

#[cfg(test)]
mod tests;
