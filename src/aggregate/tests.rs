//! Tests for the aggregate module

use super::*;
use crate::error::{Error, FetchError, FetchFailure};
use crate::fetch::{FetchBatch, FetchedPage, PageResult};
use crate::pagination::PageRequest;
use pretty_assertions::assert_eq;
use serde_json::json;

fn ok_page(n: u64, rows: &[u64]) -> PageResult {
    let data: Vec<_> = rows.iter().map(|r| json!({ "row": r })).collect();
    Ok(FetchedPage {
        request: PageRequest::new(format!("https://h/page/{n}"), n * 5000),
        body: json!({ "data": data }),
    })
}

fn failed_page(n: u64) -> PageResult {
    Err(FetchError::new(
        format!("https://h/page/{n}"),
        FetchFailure::Status {
            status: 500,
            body: "boom".to_string(),
        },
    ))
}

fn rows(dataset: &Dataset) -> Vec<u64> {
    dataset
        .records()
        .iter()
        .map(|r| r["row"].as_u64().unwrap())
        .collect()
}

// ============================================================================
// PagePayload Tests
// ============================================================================

#[test]
fn test_payload_parses_paging() {
    let payload = PagePayload::from_value(json!({
        "data": [{"a": 1}],
        "paging": {
            "rows": 1,
            "totalRows": 12001,
            "urls": {"nextPage": "https://h/api/v2/Inventory/abc"}
        }
    }))
    .unwrap();

    assert_eq!(payload.data.len(), 1);
    assert_eq!(payload.total_rows(), Some(12001));
    assert_eq!(payload.next_page(), Some("https://h/api/v2/Inventory/abc"));
}

#[test]
fn test_payload_null_next_page() {
    let payload = PagePayload::from_value(json!({
        "data": [],
        "paging": {"totalRows": 0, "urls": {"nextPage": null}}
    }))
    .unwrap();
    assert_eq!(payload.next_page(), None);

    let payload = PagePayload::from_value(json!({"data": []})).unwrap();
    assert_eq!(payload.next_page(), None);
    assert_eq!(payload.total_rows(), None);

    let payload = PagePayload::from_value(json!({
        "data": [],
        "paging": {"urls": {"nextPage": ""}}
    }))
    .unwrap();
    assert_eq!(payload.next_page(), None);
}

#[test]
fn test_payload_without_data_is_aggregation_error() {
    let err = PagePayload::from_value(json!({"message": "no"})).unwrap_err();
    assert!(matches!(err, Error::Aggregation { .. }));

    let err = PagePayload::from_value(json!({"data": {"not": "a list"}})).unwrap_err();
    assert!(matches!(err, Error::Aggregation { .. }));
}

// ============================================================================
// ResultAggregator Tests
// ============================================================================

#[test]
fn test_merge_first_page_only() {
    let first = PagePayload::new(vec![json!({"row": 1}), json!({"row": 2})]);

    let outcome = ResultAggregator::merge(first.clone(), Vec::new());

    assert_eq!(outcome.dataset.records(), first.data.as_slice());
    assert_eq!(
        outcome.report,
        MergeReport {
            expected_pages: 1,
            succeeded: 1,
            failures: Vec::new(),
            missing: 0,
        }
    );
    assert!(outcome.report.is_complete());
}

#[test]
fn test_merge_keeps_first_page_then_arrival_order() {
    let first = PagePayload::new(vec![json!({"row": 0}), json!({"row": 1})]);
    let rest = vec![ok_page(2, &[20, 21]), ok_page(1, &[10, 11])];

    let outcome = ResultAggregator::merge(first, rest);

    assert_eq!(rows(&outcome.dataset), vec![0, 1, 20, 21, 10, 11]);
    assert_eq!(outcome.report.succeeded, 3);
    assert!(outcome.report.is_complete());
}

#[test]
fn test_merge_isolates_failed_page() {
    let first = PagePayload::new(vec![json!({"row": 0})]);
    let rest: Vec<PageResult> = (1..=10)
        .map(|n| if n == 7 { failed_page(n) } else { ok_page(n, &[n]) })
        .collect();

    let outcome = ResultAggregator::merge(first, rest);

    assert_eq!(outcome.report.expected_pages, 11);
    assert_eq!(outcome.report.succeeded, 10);
    assert_eq!(outcome.report.failed(), 1);
    assert_eq!(outcome.report.failures[0].url, "https://h/page/7");
    assert!(!outcome.report.is_complete());
    assert_eq!(rows(&outcome.dataset), vec![0, 1, 2, 3, 4, 5, 6, 8, 9, 10]);
}

#[test]
fn test_merge_treats_bad_shape_as_failure() {
    let first = PagePayload::new(vec![json!({"row": 0})]);
    let bad = Ok(FetchedPage {
        request: PageRequest::new("https://h/page/3", 15000),
        body: json!({"error": "session expired"}),
    });

    let outcome = ResultAggregator::merge(first, vec![ok_page(1, &[1]), bad]);

    assert_eq!(rows(&outcome.dataset), vec![0, 1]);
    assert_eq!(outcome.report.failed(), 1);
    let failure = &outcome.report.failures[0];
    assert_eq!(failure.url, "https://h/page/3");
    assert!(matches!(failure.failure, FetchFailure::Payload { .. }));
}

#[test]
fn test_merge_batch_counts_missing_pages() {
    let first = PagePayload::new(vec![json!({"row": 0})]);
    let batch = FetchBatch {
        results: vec![ok_page(1, &[1]), ok_page(2, &[2])],
        total: 5,
        cancelled: true,
    };

    let outcome = ResultAggregator::merge_batch(first, batch);

    assert_eq!(outcome.report.expected_pages, 6);
    assert_eq!(outcome.report.succeeded, 3);
    assert_eq!(outcome.report.missing, 3);
    assert!(!outcome.report.is_complete());
}

#[test]
fn test_dataset_accessors() {
    let dataset = Dataset::new(vec![json!(1), json!(2)]);
    assert_eq!(dataset.len(), 2);
    assert!(!dataset.is_empty());
    assert_eq!(dataset.into_records(), vec![json!(1), json!(2)]);
    assert!(Dataset::default().is_empty());
}
