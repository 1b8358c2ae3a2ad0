//! Engine types
//!
//! Run configuration, phase tracking and per-environment outcomes.

use crate::aggregate::{Dataset, MergeReport};
use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::types::{JsonValue, Method, DEFAULT_MAX_CONCURRENCY, DEFAULT_STRIDE};
use chrono::Utc;
use std::fmt;
use std::path::PathBuf;

/// Configuration for an export run
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// URL of the first-page query; generated links replace its last segment
    pub query_url: String,
    /// Method of the first-page query
    pub method: Method,
    /// Body of the first-page query
    pub body: JsonValue,
    /// Rows between generated links
    pub stride: u64,
    /// Page fetches allowed in flight at once
    pub max_concurrency: usize,
}

impl EngineConfig {
    /// Create a config querying `query_url` with an empty POST body
    pub fn new(query_url: impl Into<String>) -> Self {
        Self {
            query_url: query_url.into(),
            method: Method::POST,
            body: JsonValue::Object(serde_json::Map::new()),
            stride: DEFAULT_STRIDE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Build from a loaded export config, resolving the time window now
    pub fn from_export_config(config: &ExportConfig) -> Result<Self> {
        Ok(Self {
            query_url: config.query_url()?,
            method: config.method,
            body: config.query_body(Utc::now()),
            stride: config.stride,
            max_concurrency: config.max_concurrency,
        })
    }

    /// Set the first-page method
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the first-page body
    #[must_use]
    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = body;
        self
    }

    /// Set the stride
    #[must_use]
    pub fn with_stride(mut self, stride: u64) -> Self {
        self.stride = stride;
        self
    }

    /// Set the concurrency cap
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }
}

/// Step reached by an environment run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// The first page was the only page
    NoPaginationNeeded,
    /// The first page reported further pages
    FirstPageFetched,
    /// The `nextPage` cursor was decoded
    CursorDecoded,
    /// Remaining page links were generated
    LinksEnumerated,
    /// Generated pages are being fetched
    Fetching,
    /// Some pages failed or were never fetched
    PartiallyFailed,
    /// Pages are being merged
    Aggregating,
    /// The run stopped before producing a paginated dataset
    Aborted,
    /// The run finished
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::NoPaginationNeeded => "no-pagination-needed",
            RunPhase::FirstPageFetched => "first-page-fetched",
            RunPhase::CursorDecoded => "cursor-decoded",
            RunPhase::LinksEnumerated => "links-enumerated",
            RunPhase::Fetching => "fetching",
            RunPhase::PartiallyFailed => "partially-failed",
            RunPhase::Aggregating => "aggregating",
            RunPhase::Aborted => "aborted",
            RunPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// What an environment run produced
#[derive(Debug)]
pub enum EnvironmentOutcome {
    /// Every page contributed its records
    Complete {
        /// Merged records
        dataset: Dataset,
    },
    /// Some pages failed or were cut off by cancellation
    Partial {
        /// Records of the pages that succeeded
        dataset: Dataset,
        /// Page accounting
        report: MergeReport,
    },
    /// Pagination could not proceed; only the first page is kept
    Salvaged {
        /// Records of the first page
        dataset: Dataset,
        /// Why pagination stopped
        error: Error,
    },
    /// Nothing was produced
    Skipped {
        /// Why the environment was skipped
        error: Error,
    },
}

impl EnvironmentOutcome {
    /// Dataset to hand to the exporter, if any
    pub fn dataset(&self) -> Option<&Dataset> {
        match self {
            Self::Complete { dataset }
            | Self::Partial { dataset, .. }
            | Self::Salvaged { dataset, .. } => Some(dataset),
            Self::Skipped { .. } => None,
        }
    }

    /// Whether the environment produced nothing
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// Whether every page made it into the dataset
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

/// Result of one environment run
#[derive(Debug)]
pub struct EnvironmentReport {
    /// Environment name
    pub environment: String,
    /// Phases entered, in order
    pub phases: Vec<RunPhase>,
    /// Final outcome
    pub outcome: EnvironmentOutcome,
    /// Where the dataset was written, when an exporter is attached
    pub output: Option<PathBuf>,
}

impl EnvironmentReport {
    /// Last phase entered
    pub fn final_phase(&self) -> Option<RunPhase> {
        self.phases.last().copied()
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        match &self.outcome {
            EnvironmentOutcome::Complete { dataset } => {
                format!("{}: complete, {} records", self.environment, dataset.len())
            }
            EnvironmentOutcome::Partial { dataset, report } => format!(
                "{}: partial, {} of {} pages succeeded, {} failed, {} not fetched, {} records",
                self.environment,
                report.succeeded,
                report.expected_pages,
                report.failed(),
                report.missing,
                dataset.len()
            ),
            EnvironmentOutcome::Salvaged { dataset, error } => format!(
                "{}: first page only ({} records), pagination aborted: {error}",
                self.environment,
                dataset.len()
            ),
            EnvironmentOutcome::Skipped { error } => {
                format!("{}: skipped: {error}", self.environment)
            }
        }
    }
}
