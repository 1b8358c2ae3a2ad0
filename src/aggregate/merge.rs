//! Fan-in of fetched pages

use super::types::{Dataset, MergeOutcome, MergeReport, PagePayload};
use crate::error::FetchError;
use crate::fetch::{FetchBatch, PageResult};
use tracing::warn;

/// Concatenates page batches into one dataset
///
/// Pages cover disjoint row ranges, so arrival order does not affect
/// completeness; rows inside a page keep their server order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAggregator;

impl ResultAggregator {
    /// Merge the first page with the remaining page results
    ///
    /// Failed pages and pages without a usable `data` array are left out of
    /// the dataset and listed in the report.
    pub fn merge(
        first_page: PagePayload,
        rest: impl IntoIterator<Item = PageResult>,
    ) -> MergeOutcome {
        let mut dataset = Dataset::new(first_page.data);
        let mut report = MergeReport {
            expected_pages: 1,
            succeeded: 1,
            ..MergeReport::default()
        };

        for result in rest {
            report.expected_pages += 1;
            match result.and_then(|page| {
                PagePayload::from_value(page.body)
                    .map_err(|e| FetchError::from_error(page.request.url, e))
            }) {
                Ok(payload) => {
                    dataset.extend(payload.data);
                    report.succeeded += 1;
                }
                Err(failure) => {
                    warn!("Excluding page from dataset: {failure}");
                    report.failures.push(failure);
                }
            }
        }

        MergeOutcome { dataset, report }
    }

    /// Merge a fetch batch, counting pages lost to cancellation as missing
    pub fn merge_batch(first_page: PagePayload, batch: FetchBatch) -> MergeOutcome {
        let missing = batch.missing();
        let mut outcome = Self::merge(first_page, batch.results);
        outcome.report.missing = missing;
        outcome.report.expected_pages += missing;
        outcome
    }
}
