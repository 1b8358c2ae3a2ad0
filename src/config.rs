//! Export configuration
//!
//! Everything a run needs is carried in one [`ExportConfig`] loaded from
//! YAML and passed into the entry point; nothing is read from process-wide
//! state once the run starts.

use crate::auth::{Credentials, DEFAULT_TOKEN_EXPIRY_SECS};
use crate::error::{Error, Result};
use crate::http::RateLimiterConfig;
use crate::output::output_stem;
use crate::types::{BackoffType, JsonValue, Method, OptionStringExt, DEFAULT_MAX_CONCURRENCY, DEFAULT_STRIDE};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Tenant name, expanded to `https://<company>.lacework.net`
    #[serde(default)]
    pub company: Option<String>,

    /// Explicit API base URL, takes precedence over `company`
    #[serde(default)]
    pub base_url: Option<String>,

    /// Search endpoint queried for the first page
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Method of the first-page query
    #[serde(default)]
    pub method: Method,

    /// JSON body of the first-page query
    #[serde(default = "default_filters")]
    pub filters: JsonValue,

    /// Adds a `timeFilter` covering the last N hours to the query body
    #[serde(default)]
    pub time_window_hours: Option<u32>,

    /// Rows between generated page links
    #[serde(default = "default_stride")]
    pub stride: u64,

    /// Page fetches allowed in flight at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Lifetime requested for access tokens
    #[serde(default = "default_token_expiry_secs")]
    pub token_expiry_secs: u64,

    /// Optional request rate limit shared by all workers
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,

    /// Retries for failed requests, off by default
    #[serde(default)]
    pub retry: RetryConfig,

    /// Directory exported datasets are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Accounts processed in order
    #[serde(default)]
    pub environments: Vec<EnvironmentConfig>,
}

fn default_endpoint() -> String {
    "/api/v2/Inventory/search".to_string()
}

fn default_filters() -> JsonValue {
    JsonValue::Object(serde_json::Map::new())
}

fn default_stride() -> u64 {
    DEFAULT_STRIDE
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_token_expiry_secs() -> u64 {
    DEFAULT_TOKEN_EXPIRY_SECS
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

// ============================================================================
// Retry Config
// ============================================================================

/// Retry behaviour of the HTTP client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 reports a failed page at once
    #[serde(default)]
    pub max_retries: u32,

    /// How the delay grows between attempts
    #[serde(default)]
    pub backoff: BackoffType,

    /// First delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound on any delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff: BackoffType::default(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    /// First delay
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Largest delay
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

impl ExportConfig {
    /// Load and validate a YAML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file '{}': {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate YAML config text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the config for values a run cannot work with
    pub fn validate(&self) -> Result<()> {
        self.api_base_url()?;

        if self.stride == 0 {
            return Err(Error::invalid_value("stride", "must be greater than zero"));
        }
        if self.max_concurrency == 0 {
            return Err(Error::invalid_value(
                "max_concurrency",
                "must be greater than zero",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::invalid_value(
                "request_timeout_secs",
                "must be greater than zero",
            ));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(Error::invalid_value(
                "retry.initial_backoff_ms",
                "must not exceed retry.max_backoff_ms",
            ));
        }
        if !self.endpoint.starts_with('/') {
            return Err(Error::invalid_value("endpoint", "must start with '/'"));
        }
        if self.environments.is_empty() {
            return Err(Error::missing_field("environments"));
        }

        let mut seen = HashMap::new();
        for env in &self.environments {
            if env.name.trim().is_empty() {
                return Err(Error::missing_field("environments[].name"));
            }
            if let Some(other) = seen.insert(output_stem(&env.name), env.name.as_str()) {
                let message = if other == env.name {
                    format!("duplicate environment '{}'", env.name)
                } else {
                    format!(
                        "environments '{other}' and '{}' would write the same output file",
                        env.name
                    )
                };
                return Err(Error::invalid_value("environments", message));
            }
        }
        Ok(())
    }

    /// API base URL, from `base_url` or derived from `company`
    pub fn api_base_url(&self) -> Result<String> {
        if let Some(url) = self.base_url.clone().none_if_empty() {
            return Ok(url.trim_end_matches('/').to_string());
        }
        match self.company.clone().none_if_empty() {
            Some(company) => Ok(format!("https://{company}.lacework.net")),
            None => Err(Error::missing_field("company")),
        }
    }

    /// Full URL of the first-page query
    pub fn query_url(&self) -> Result<String> {
        Ok(format!("{}{}", self.api_base_url()?, self.endpoint))
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Query body, with the rolling time window applied relative to `now`
    pub fn query_body(&self, now: DateTime<Utc>) -> JsonValue {
        let mut body = self.filters.clone();
        if let (Some(hours), JsonValue::Object(map)) = (self.time_window_hours, &mut body) {
            let start = now - ChronoDuration::hours(i64::from(hours));
            map.insert(
                "timeFilter".to_string(),
                serde_json::json!({
                    "startTime": start.format("%Y-%m-%d").to_string(),
                    "endTime": now.format("%Y-%m-%d").to_string(),
                }),
            );
        }
        body
    }

    /// Keep only the named environments, erroring on unknown names
    pub fn select_environments(&mut self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        for name in names {
            if !self.environments.iter().any(|e| &e.name == name) {
                return Err(Error::invalid_value(
                    "environment",
                    format!("'{name}' is not configured"),
                ));
            }
        }
        self.environments.retain(|e| names.contains(&e.name));
        Ok(())
    }
}

// ============================================================================
// Environments
// ============================================================================

/// One credentialed account to export
#[derive(Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Name used in logs and output file names
    pub name: String,

    /// Access key id
    pub key_id: String,

    /// Access key secret
    #[serde(default)]
    pub secret: Option<String>,

    /// Environment variable holding the secret, used when `secret` is absent
    #[serde(default)]
    pub secret_env: Option<String>,
}

impl EnvironmentConfig {
    /// Create an environment with an inline secret
    pub fn new(
        name: impl Into<String>,
        key_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            key_id: key_id.into(),
            secret: Some(secret.into()),
            secret_env: None,
        }
    }

    /// Resolve the key pair for the token provider
    pub fn credentials(&self) -> Result<Credentials> {
        let secret = match (self.secret.clone().none_if_empty(), &self.secret_env) {
            (Some(secret), _) => secret,
            (None, Some(var)) => std::env::var(var).map_err(|_| {
                Error::token(format!(
                    "secret variable '{var}' for environment '{}' is not set",
                    self.name
                ))
            })?,
            (None, None) => {
                return Err(Error::token(format!(
                    "no secret configured for environment '{}'",
                    self.name
                )))
            }
        };
        Ok(Credentials::new(self.key_id.clone(), secret))
    }
}

impl std::fmt::Debug for EnvironmentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentConfig")
            .field("name", &self.name)
            .field("key_id", &self.key_id)
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .field("secret_env", &self.secret_env)
            .finish()
    }
}
