//! Tests for the auth module

use super::*;
use crate::error::Error;
use crate::http::HttpClient;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> AccessKeyTokenProvider {
    AccessKeyTokenProvider::new(HttpClient::new().unwrap(), &server.uri())
}

#[tokio::test]
async fn test_static_token_provider() {
    let provider = StaticTokenProvider::new("fixed");
    let token = provider
        .token(&Credentials::new("id", "secret"))
        .await
        .unwrap();
    assert_eq!(token.as_str(), "fixed");
    assert!(token.expires_at.is_none());
}

#[test]
fn test_token_url_from_base() {
    let provider =
        AccessKeyTokenProvider::new(HttpClient::new().unwrap(), "https://acme.lacework.net/");
    assert_eq!(
        provider.token_url(),
        "https://acme.lacework.net/api/v2/access/tokens"
    );
}

#[tokio::test]
async fn test_access_key_token_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/access/tokens"))
        .and(header("X-LW-UAKS", "s3cret"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"keyId": "KEY_1", "expiryTime": 3600})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": "issued-token",
            "expiresAt": "2099-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = provider(&server)
        .token(&Credentials::new("KEY_1", "s3cret"))
        .await
        .unwrap();

    assert_eq!(token.as_str(), "issued-token");
    assert!(!token.is_expired());
}

#[tokio::test]
async fn test_access_key_custom_expiry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_json(json!({"keyId": "K", "expiryTime": 600})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t"})))
        .expect(1)
        .mount(&server)
        .await;

    let token = provider(&server)
        .with_expiry(600)
        .token(&Credentials::new("K", "S"))
        .await
        .unwrap();

    // no expiresAt in the response: lifetime derived from the request
    assert!(token.expires_at.is_some());
    assert!(!token.is_expired());
}

#[tokio::test]
async fn test_access_key_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .token(&Credentials::new("K", "bad"))
        .await
        .unwrap_err();

    match err {
        Error::Token { message } => assert!(message.contains("401"), "{message}"),
        other => panic!("Expected Token error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_access_key_missing_token_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let err = provider(&server)
        .token(&Credentials::new("K", "S"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Token { .. }));
}

#[tokio::test]
async fn test_access_key_empty_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": ""})))
        .mount(&server)
        .await;

    let err = provider(&server)
        .token(&Credentials::new("K", "S"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("empty token"));
}
