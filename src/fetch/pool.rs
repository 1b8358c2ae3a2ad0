//! Bounded worker pool
//!
//! A fixed set of workers drains a shared request queue and pushes each
//! result into a completion channel as soon as its fetch returns.

use super::types::{
    FetchBatch, FetchProgress, FetchedPage, PageFetcher, PageResult, ProgressCallback,
};
use crate::error::{Error, Result};
use crate::pagination::PageRequest;
use crate::types::DEFAULT_MAX_CONCURRENCY;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Fetches page requests concurrently with a cap on in-flight requests
#[derive(Clone)]
pub struct ConcurrentFetcher {
    fetcher: Arc<dyn PageFetcher>,
    max_concurrency: usize,
    progress: Option<ProgressCallback>,
}

impl ConcurrentFetcher {
    /// Create a fetcher allowing at most `max_concurrency` requests in flight
    pub fn new(fetcher: Arc<dyn PageFetcher>, max_concurrency: usize) -> Result<Self> {
        if max_concurrency == 0 {
            return Err(Error::invalid_value(
                "max_concurrency",
                "must be greater than zero",
            ));
        }
        Ok(Self {
            fetcher,
            max_concurrency,
            progress: None,
        })
    }

    /// Create a fetcher with the default cap of 25
    pub fn with_default_concurrency(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            progress: None,
        }
    }

    /// Report completion counts through `callback`
    #[must_use]
    pub fn with_progress(mut self, callback: impl Fn(FetchProgress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Maximum simultaneous requests
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Fetch every request, returning results in completion order
    ///
    /// A failed page never stops its siblings. Once `cancel` fires no queued
    /// request is dispatched, and results of requests still in flight are dropped.
    pub async fn fetch_all(
        &self,
        token: &str,
        requests: Vec<PageRequest>,
        cancel: &CancellationToken,
    ) -> FetchBatch {
        let total = requests.len();
        if total == 0 {
            return FetchBatch::default();
        }

        let worker_count = self.max_concurrency.min(total);
        let (queue_tx, queue_rx) = flume::bounded::<PageRequest>(total);
        for request in requests {
            // Capacity equals the request count and a receiver is held, so this never fails
            if queue_tx.send(request).is_err() {
                break;
            }
        }
        drop(queue_tx);

        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<PageResult>();
        let token: Arc<str> = Arc::from(token);
        let mut workers = JoinSet::new();

        debug!("Dispatching {total} page requests across {worker_count} workers");
        for worker_id in 0..worker_count {
            workers.spawn(run_worker(
                worker_id,
                queue_rx.clone(),
                result_tx.clone(),
                Arc::clone(&self.fetcher),
                Arc::clone(&token),
                cancel.clone(),
            ));
        }
        drop(queue_rx);
        drop(result_tx);

        let mut results = Vec::with_capacity(total);
        let mut failed = 0;
        while let Some(result) = result_rx.recv().await {
            if let Err(e) = &result {
                failed += 1;
                warn!("Page fetch failed: {e}");
            }
            results.push(result);

            if let Some(callback) = &self.progress {
                callback(FetchProgress {
                    completed: results.len(),
                    failed,
                    total,
                });
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("Fetch worker terminated abnormally: {e}");
            }
        }

        let cancelled = cancel.is_cancelled() && results.len() < total;
        if cancelled {
            warn!(
                "Fetch cancelled after {} of {total} pages",
                results.len()
            );
        }

        FetchBatch {
            results,
            total,
            cancelled,
        }
    }
}

impl std::fmt::Debug for ConcurrentFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentFetcher")
            .field("max_concurrency", &self.max_concurrency)
            .field("has_progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

async fn run_worker(
    worker_id: usize,
    queue: flume::Receiver<PageRequest>,
    results: mpsc::UnboundedSender<PageResult>,
    fetcher: Arc<dyn PageFetcher>,
    token: Arc<str>,
    cancel: CancellationToken,
) {
    loop {
        let request = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = queue.recv_async() => match next {
                Ok(request) => request,
                Err(_) => break,
            },
        };

        debug!(worker_id, row = request.row, "Fetching page");
        let outcome = fetcher.fetch_page(&token, &request.url).await;

        if cancel.is_cancelled() {
            debug!(worker_id, url = %request.url, "Discarding page completed after cancellation");
            break;
        }

        let result = outcome.map(|body| FetchedPage { request, body });
        if results.send(result).is_err() {
            break;
        }
    }
}
