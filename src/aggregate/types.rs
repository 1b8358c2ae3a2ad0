//! Aggregation types
//!
//! Page payload shape and the merged dataset handed to exporters.

use crate::error::{Error, FetchError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Paging metadata returned alongside a record batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    /// Total rows in the result set
    #[serde(default)]
    pub total_rows: Option<u64>,
    /// Continuation links
    #[serde(default)]
    pub urls: Option<PagingUrls>,
}

/// Continuation links of a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingUrls {
    /// Link to the following page, null on the last one
    #[serde(default)]
    pub next_page: Option<String>,
}

/// One page of results: `{data: [...], paging: {totalRows, urls: {nextPage}}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PagePayload {
    /// Record batch, in server order
    pub data: Vec<Value>,
    /// Paging metadata
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl PagePayload {
    /// Create a payload without paging metadata
    pub fn new(data: Vec<Value>) -> Self {
        Self { data, paging: None }
    }

    /// Parse a raw response body
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::aggregation(e.to_string()))
    }

    /// The `nextPage` link, if the server reported further pages
    pub fn next_page(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|p| p.urls.as_ref())
            .and_then(|u| u.next_page.as_deref())
            .filter(|link| !link.trim().is_empty())
    }

    /// `totalRows` reported by the server
    pub fn total_rows(&self) -> Option<u64> {
        self.paging.as_ref().and_then(|p| p.total_rows)
    }
}

/// All records of an environment run, first page first, then in arrival order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Value>,
}

impl Dataset {
    /// Create a dataset from records
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrow the records
    pub fn records(&self) -> &[Value] {
        &self.records
    }

    /// Take ownership of the records
    pub fn into_records(self) -> Vec<Value> {
        self.records
    }

    pub(crate) fn extend(&mut self, batch: Vec<Value>) {
        self.records.extend(batch);
    }
}

/// How many pages made it into a dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// First page plus every generated page
    pub expected_pages: usize,
    /// Pages whose records are in the dataset
    pub succeeded: usize,
    /// Pages that failed to fetch or had an unusable body
    pub failures: Vec<FetchError>,
    /// Pages never fetched because the run was cancelled
    pub missing: usize,
}

impl MergeReport {
    /// Number of failed pages
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Whether every expected page contributed its records
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.missing == 0
    }
}

/// Result of merging pages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    /// Merged records
    pub dataset: Dataset,
    /// Page accounting
    pub report: MergeReport,
}
