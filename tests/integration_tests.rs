//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: YAML config → token → first page →
//! generated page links → concurrent fetch → JSON Lines output

use clap::Parser;
use cursor_fanout::cli::{Cli, Commands, Runner};
use cursor_fanout::engine::{EnvironmentOutcome, RunPhase};
use cursor_fanout::fetch::ConcurrentFetcher;
use cursor_fanout::http::HttpClient;
use cursor_fanout::pagination::{CursorCodec, LinkEnumerator, PageRequest, PaginationCursor};
use cursor_fanout::{Dataset, ResultAggregator};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const SEARCH_PATH: &str = "/api/v2/Inventory/search";
const PAGE_PATH: &str = r"^/api/v2/Inventory/[A-Za-z0-9+=]+$";

/// Answers generated page requests with one record per row offset
struct CursorPages {
    fail_rows: Vec<u64>,
}

impl Respond for CursorPages {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let cursor = CursorCodec::decode(request.url.as_str()).unwrap();
        if self.fail_rows.contains(&cursor.current_row) {
            return ResponseTemplate::new(500).set_body_string("internal error");
        }
        ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"offset": cursor.current_row, "session": cursor.session_id}],
            "paging": {"urls": {"nextPage": null}}
        }))
    }
}

fn offsets(records: &[Value]) -> Vec<u64> {
    let mut offsets: Vec<u64> = records
        .iter()
        .map(|r| r["offset"].as_u64().unwrap())
        .collect();
    offsets.sort_unstable();
    offsets
}

// ============================================================================
// Cursor and Link Tests
// ============================================================================

#[test]
fn test_enumerate_links_from_next_page() {
    let next_page = format!(
        "https://acme.lacework.net/api/v2/Inventory/{}",
        CursorCodec::encode(&PaginationCursor::new("sess", 0, 12000, 1))
    );

    let cursor = CursorCodec::decode(&next_page).unwrap();
    let enumerator =
        LinkEnumerator::new("https://acme.lacework.net/api/v2/Inventory/search", 5000).unwrap();
    let links = enumerator.enumerate(&cursor).unwrap();

    let decoded: Vec<PaginationCursor> = links
        .iter()
        .map(|request| CursorCodec::decode(&request.url).unwrap())
        .collect();
    assert_eq!(
        decoded,
        vec![
            PaginationCursor::new("sess", 0, 12000, 0),
            PaginationCursor::new("sess", 5000, 12000, 0),
            PaginationCursor::new("sess", 10000, 12000, 0),
        ]
    );
    assert!(links
        .iter()
        .all(|r| r.url.starts_with("https://acme.lacework.net/api/v2/Inventory/")));
    assert_eq!(enumerator.enumerate(&cursor).unwrap(), links);
}

// ============================================================================
// Fetch + Aggregate Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_and_merge_with_one_failed_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(PAGE_PATH))
        .and(header("Authorization", "tok"))
        .and(header("Accept", "application/json"))
        .respond_with(CursorPages {
            fail_rows: vec![30],
        })
        .expect(10)
        .mount(&server)
        .await;

    let cursor = PaginationCursor::new("s1", 0, 45, 1);
    let enumerator =
        LinkEnumerator::new(&format!("{}{SEARCH_PATH}", server.uri()), 5).unwrap();
    let requests: Vec<PageRequest> = enumerator.enumerate(&cursor).unwrap();
    assert_eq!(requests.len(), 10);

    let fetcher = ConcurrentFetcher::new(Arc::new(HttpClient::new().unwrap()), 4).unwrap();
    let batch = fetcher
        .fetch_all("tok", requests, &CancellationToken::new())
        .await;
    assert_eq!(batch.succeeded(), 9);
    assert_eq!(batch.failed(), 1);

    let first = cursor_fanout::aggregate::PagePayload::new(Vec::new());
    let merged = ResultAggregator::merge_batch(first, batch);

    assert_eq!(
        offsets(merged.dataset.records()),
        vec![0, 5, 10, 15, 20, 25, 35, 40, 45]
    );
    assert_eq!(merged.report.failed(), 1);
    assert_eq!(merged.report.failures[0].status(), Some(500));
    assert!(merged.report.failures[0].url.contains("/api/v2/Inventory/"));
}

// ============================================================================
// End-to-end CLI Tests
// ============================================================================

async fn mount_tokens(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v2/access/tokens"))
        .and(header("X-LW-UAKS", "SECRET-PROD"))
        .and(body_json(json!({"keyId": "KEY-PROD", "expiryTime": 3600})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-prod",
            "expiresAt": "2099-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/access/tokens"))
        .and(header("X-LW-UAKS", "SECRET-DEV"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .expect(1)
        .mount(server)
        .await;
}

fn write_config(dir: &TempDir, server: &MockServer) -> std::path::PathBuf {
    let yaml = format!(
        r"
base_url: {uri}
filters:
  csp: AWS
stride: 5000
max_concurrency: 3
output_dir: {out}
environments:
  - name: prod
    key_id: KEY-PROD
    secret: SECRET-PROD
  - name: dev
    key_id: KEY-DEV
    secret: SECRET-DEV
",
        uri = server.uri(),
        out = dir.path().join("out").display()
    );
    let path = dir.path().join("export.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

#[tokio::test]
async fn test_run_exports_each_environment() {
    let server = MockServer::start().await;
    mount_tokens(&server).await;

    let next_page = format!(
        "{}/api/v2/Inventory/{}",
        server.uri(),
        CursorCodec::encode(&PaginationCursor::new("abc123", 5000, 22000, 1))
    );
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(header("Authorization", "tok-prod"))
        .and(body_json(json!({"csp": "AWS"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"offset": 0}],
            "paging": {"totalRows": 22000, "urls": {"nextPage": next_page}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(PAGE_PATH))
        .and(header("Authorization", "tok-prod"))
        .respond_with(CursorPages {
            fail_rows: Vec::new(),
        })
        .expect(4)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, &server);
    let cli = Cli::try_parse_from([
        "cursor-fanout",
        "-v",
        "run",
        "--config",
        config_path.to_str().unwrap(),
    ])
    .unwrap();
    let Commands::Run(args) = &cli.command else {
        panic!("expected run command");
    };
    let args = args.clone();

    let reports = Runner::new(cli)
        .export(&args, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(reports.len(), 2);

    let prod = &reports[0];
    assert_eq!(prod.environment, "prod");
    assert_eq!(prod.final_phase(), Some(RunPhase::Done));
    let EnvironmentOutcome::Complete { dataset } = &prod.outcome else {
        panic!("expected complete export, got {:?}", prod.outcome);
    };
    assert_eq!(offsets(dataset.records()), vec![0, 5000, 10000, 15000, 20000]);

    let output = prod.output.clone().unwrap();
    assert_eq!(output, dir.path().join("out/prod_output.jsonl"));
    let written: Vec<Value> = std::fs::read_to_string(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(Dataset::new(written), dataset.clone());

    let dev = &reports[1];
    assert!(dev.outcome.is_skipped());
    assert!(dev.output.is_none());
    assert!(!dir.path().join("out/dev_output.jsonl").exists());
}

#[tokio::test]
async fn test_run_with_environment_filter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/access/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok-prod"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"offset": 0}, {"offset": 1}],
            "paging": {"totalRows": 2, "urls": {"nextPage": null}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, &server);
    let cli = Cli::try_parse_from([
        "cursor-fanout",
        "run",
        "--config",
        config_path.to_str().unwrap(),
        "--environment",
        "prod",
        "--concurrency",
        "1",
    ])
    .unwrap();
    let Commands::Run(args) = &cli.command else {
        panic!("expected run command");
    };
    let args = args.clone();

    let reports = Runner::new(cli)
        .export(&args, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(
        reports[0].phases,
        vec![RunPhase::NoPaginationNeeded, RunPhase::Done]
    );
    assert_eq!(reports[0].outcome.dataset().map(Dataset::len), Some(2));
}

#[tokio::test]
async fn test_run_rejects_unknown_environment() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, &server);
    let cli = Cli::try_parse_from([
        "cursor-fanout",
        "run",
        "--config",
        config_path.to_str().unwrap(),
        "-e",
        "staging",
    ])
    .unwrap();
    let Commands::Run(args) = &cli.command else {
        panic!("expected run command");
    };
    let args = args.clone();

    let err = Runner::new(cli)
        .export(&args, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("staging"));
}
