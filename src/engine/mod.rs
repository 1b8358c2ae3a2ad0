//! Export engine
//!
//! Drives one environment at a time through the export:
//! token, first page, cursor decode, link enumeration, concurrent fetch,
//! merge.
//!
//! # Overview
//!
//! - `ExportEngine` - runs environments sequentially, isolating failures
//! - `EngineConfig` - query, stride and concurrency settings
//! - `EnvironmentReport` - phases entered and the final outcome

mod types;

pub use types::{EngineConfig, EnvironmentOutcome, EnvironmentReport, RunPhase};

use crate::aggregate::{Dataset, PagePayload, ResultAggregator};
use crate::auth::TokenProvider;
use crate::config::EnvironmentConfig;
use crate::error::{Error, Result};
use crate::fetch::{ConcurrentFetcher, FetchProgress, PageFetcher};
use crate::output::DatasetExporter;
use crate::pagination::{CursorCodec, LinkEnumerator, PageRequest};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Orchestrates exports across environments
pub struct ExportEngine {
    fetcher: Arc<dyn PageFetcher>,
    tokens: Arc<dyn TokenProvider>,
    pool: ConcurrentFetcher,
    exporter: Option<Arc<dyn DatasetExporter>>,
    config: EngineConfig,
}

impl ExportEngine {
    /// Create an engine
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        tokens: Arc<dyn TokenProvider>,
        config: EngineConfig,
    ) -> Result<Self> {
        if config.stride == 0 {
            return Err(Error::invalid_value("stride", "must be greater than zero"));
        }
        let pool = ConcurrentFetcher::new(Arc::clone(&fetcher), config.max_concurrency)?;
        Ok(Self {
            fetcher,
            tokens,
            pool,
            exporter: None,
            config,
        })
    }

    /// Hand each environment's dataset to `exporter` once its run ends
    #[must_use]
    pub fn with_exporter(mut self, exporter: Arc<dyn DatasetExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Report page completion counts through `callback`
    #[must_use]
    pub fn with_progress(
        mut self,
        callback: impl Fn(FetchProgress) + Send + Sync + 'static,
    ) -> Self {
        self.pool = self.pool.with_progress(callback);
        self
    }

    /// Get the engine config
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run every environment in order
    ///
    /// A failed environment never stops the next one. Once `cancel` fires the
    /// remaining environments are reported as skipped without being contacted.
    pub async fn run_all(
        &self,
        environments: &[EnvironmentConfig],
        cancel: &CancellationToken,
    ) -> Vec<EnvironmentReport> {
        let mut reports = Vec::with_capacity(environments.len());

        for env in environments {
            if cancel.is_cancelled() {
                warn!("Run cancelled, skipping {}", env.name);
                reports.push(EnvironmentReport {
                    environment: env.name.clone(),
                    phases: vec![RunPhase::Aborted],
                    outcome: EnvironmentOutcome::Skipped {
                        error: Error::Cancelled,
                    },
                    output: None,
                });
                continue;
            }

            let mut report = self.run_environment(env, cancel).await;
            self.export(&mut report);
            reports.push(report);
        }

        reports
    }

    /// Run a single environment
    pub async fn run_environment(
        &self,
        env: &EnvironmentConfig,
        cancel: &CancellationToken,
    ) -> EnvironmentReport {
        let start = Instant::now();
        let mut phases = Vec::new();

        info!("Exporting environment {}", env.name);
        let outcome = self.drive(env, cancel, &mut phases).await;

        match &outcome {
            EnvironmentOutcome::Skipped { error } => {
                error!("Skipping environment {}: {error}", env.name);
            }
            EnvironmentOutcome::Salvaged { dataset, error } => {
                error!(
                    "Pagination aborted for {}: {error}; keeping {} first-page records",
                    env.name,
                    dataset.len()
                );
            }
            EnvironmentOutcome::Partial { report, .. } => {
                warn!(
                    "Environment {} incomplete: {} of {} pages succeeded, {} failed, {} not fetched",
                    env.name,
                    report.succeeded,
                    report.expected_pages,
                    report.failed(),
                    report.missing
                );
            }
            EnvironmentOutcome::Complete { dataset } => {
                info!(
                    "Environment {} complete: {} records in {}ms",
                    env.name,
                    dataset.len(),
                    start.elapsed().as_millis()
                );
            }
        }

        EnvironmentReport {
            environment: env.name.clone(),
            phases,
            outcome,
            output: None,
        }
    }

    async fn drive(
        &self,
        env: &EnvironmentConfig,
        cancel: &CancellationToken,
        phases: &mut Vec<RunPhase>,
    ) -> EnvironmentOutcome {
        let (token, first_page) = match self.first_page(env).await {
            Ok(parts) => parts,
            Err(error) => {
                phases.push(RunPhase::Aborted);
                return EnvironmentOutcome::Skipped { error };
            }
        };

        let Some(next_page) = first_page.next_page().map(str::to_string) else {
            debug!("No pagination for {}", env.name);
            phases.push(RunPhase::NoPaginationNeeded);
            phases.push(RunPhase::Done);
            return EnvironmentOutcome::Complete {
                dataset: Dataset::new(first_page.data),
            };
        };
        phases.push(RunPhase::FirstPageFetched);
        info!(
            "Pagination detected for {} ({} total rows)",
            env.name,
            first_page
                .total_rows()
                .map_or_else(|| "unknown".to_string(), |n| n.to_string())
        );

        let requests = match self.enumerate(&next_page, phases) {
            Ok(requests) => requests,
            Err(error) => {
                phases.push(RunPhase::Aborted);
                return EnvironmentOutcome::Salvaged {
                    dataset: Dataset::new(first_page.data),
                    error,
                };
            }
        };

        phases.push(RunPhase::Fetching);
        info!(
            "Fetching {} pages for {} with up to {} workers",
            requests.len(),
            env.name,
            self.pool.max_concurrency()
        );
        let batch = self.pool.fetch_all(&token, requests, cancel).await;

        phases.push(RunPhase::Aggregating);
        let merged = ResultAggregator::merge_batch(first_page, batch);
        // Bad page shapes only surface while merging
        if !merged.report.is_complete() {
            phases.push(RunPhase::PartiallyFailed);
        }
        phases.push(RunPhase::Done);

        if merged.report.is_complete() {
            EnvironmentOutcome::Complete {
                dataset: merged.dataset,
            }
        } else {
            EnvironmentOutcome::Partial {
                dataset: merged.dataset,
                report: merged.report,
            }
        }
    }

    /// Obtain a token and query the first page
    async fn first_page(&self, env: &EnvironmentConfig) -> Result<(String, PagePayload)> {
        let credentials = env.credentials()?;
        let token = self.tokens.token(&credentials).await?;

        let body = self
            .fetcher
            .query_first_page(
                token.as_str(),
                self.config.method,
                &self.config.query_url,
                &self.config.body,
            )
            .await
            .map_err(|e| match e {
                Error::FirstPage { .. } => e,
                other => Error::first_page(other.to_string()),
            })?;

        let payload = PagePayload::from_value(body)
            .map_err(|e| Error::first_page(format!("no data returned: {e}")))?;

        Ok((token.token, payload))
    }

    /// Decode the `nextPage` cursor and generate the remaining page links
    fn enumerate(
        &self,
        next_page: &str,
        phases: &mut Vec<RunPhase>,
    ) -> Result<Vec<PageRequest>> {
        let cursor = CursorCodec::decode(next_page)?;
        phases.push(RunPhase::CursorDecoded);
        debug!(
            "Decoded cursor: rows {} to {} in session {}",
            cursor.current_row, cursor.max_row, cursor.session_id
        );

        let enumerator = LinkEnumerator::new(&self.config.query_url, self.config.stride)?;
        let requests = enumerator.enumerate(&cursor)?;
        phases.push(RunPhase::LinksEnumerated);
        Ok(requests)
    }

    fn export(&self, report: &mut EnvironmentReport) {
        let Some(exporter) = &self.exporter else {
            return;
        };
        let Some(dataset) = report.outcome.dataset() else {
            return;
        };
        match exporter.export(&report.environment, dataset) {
            Ok(path) => report.output = Some(path),
            Err(e) => error!("Failed to export {}: {e}", report.environment),
        }
    }
}

impl std::fmt::Debug for ExportEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportEngine")
            .field("config", &self.config)
            .field("pool", &self.pool)
            .field("has_exporter", &self.exporter.is_some())
            .finish_non_exhaustive()
    }
}
