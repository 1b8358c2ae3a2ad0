//! Concurrent page fetching
//!
//! Fan-out half of the export: every generated page request is fetched by a
//! bounded pool of workers, and results are collected in the order they
//! complete.
//!
//! # Overview
//!
//! - [`PageFetcher`] - the network seam (one call per page)
//! - [`ConcurrentFetcher`] - worker pool with a concurrency cap, progress
//!   callback and cancellation
//! - [`FetchBatch`] - completion-ordered results of one run

mod pool;
mod types;

pub use pool::ConcurrentFetcher;
pub use types::{
    FetchBatch, FetchProgress, FetchedPage, PageFetcher, PageResult, ProgressCallback,
};
