//! Token provider implementations

use super::types::{AccessToken, Credentials, TokenResponse};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Path of the access token endpoint, relative to the API base URL
pub const ACCESS_TOKEN_PATH: &str = "/api/v2/access/tokens";

/// Token lifetime requested when none is configured
pub const DEFAULT_TOKEN_EXPIRY_SECS: u64 = 3600;

/// Issues the bearer token used for one environment's run
///
/// Called once per environment, before the first page is queried.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a token for `credentials`
    async fn token(&self, credentials: &Credentials) -> Result<AccessToken>;
}

/// Exchanges an access key pair for a short-lived token
#[derive(Debug, Clone)]
pub struct AccessKeyTokenProvider {
    client: HttpClient,
    token_url: String,
    expiry_secs: u64,
}

impl AccessKeyTokenProvider {
    /// Create a provider for the API at `base_url`
    pub fn new(client: HttpClient, base_url: &str) -> Self {
        Self {
            client,
            token_url: format!("{}{ACCESS_TOKEN_PATH}", base_url.trim_end_matches('/')),
            expiry_secs: DEFAULT_TOKEN_EXPIRY_SECS,
        }
    }

    /// Request tokens valid for `seconds`
    #[must_use]
    pub fn with_expiry(mut self, seconds: u64) -> Self {
        self.expiry_secs = seconds;
        self
    }

    /// Token endpoint URL
    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait]
impl TokenProvider for AccessKeyTokenProvider {
    async fn token(&self, credentials: &Credentials) -> Result<AccessToken> {
        debug!(key_id = %credentials.key_id, "Requesting access token");

        let config = RequestConfig::new()
            .header("X-LW-UAKS", credentials.secret.as_str())
            .json(json!({
                "keyId": credentials.key_id,
                "expiryTime": self.expiry_secs,
            }));

        let response: TokenResponse = self
            .client
            .request_json(reqwest::Method::POST, &self.token_url, config)
            .await
            .map_err(|e| match e {
                Error::JsonParse(e) => {
                    Error::token(format!("unexpected token response: {e}"))
                }
                other => Error::token(other.to_string()),
            })?;

        if response.token.trim().is_empty() {
            return Err(Error::token("token endpoint returned an empty token"));
        }

        Ok(match response.expires_at {
            Some(at) => AccessToken::new(response.token, Some(at)),
            None => AccessToken::expires_in(response.token, self.expiry_secs as i64),
        })
    }
}

/// Hands out a pre-issued token
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Create a provider returning `token`
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self, _credentials: &Credentials) -> Result<AccessToken> {
        Ok(AccessToken::new(self.token.clone(), None))
    }
}
