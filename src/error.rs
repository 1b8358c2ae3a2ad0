//! Error types for cursor-fanout
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Per-page failures are deliberately not part of [`Error`]: a page that could
//! not be fetched is data inside a result sequence, carried as [`FetchError`],
//! and never short-circuits sibling fetches.

use thiserror::Error;

/// The main error type for cursor-fanout
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Per-environment Errors
    // ============================================================================
    #[error("Token request failed: {message}")]
    Token { message: String },

    #[error("First page query failed: {message}")]
    FirstPage { message: String },

    #[error("Malformed pagination cursor in '{link}': {message}")]
    CursorDecode { link: String, message: String },

    #[error("Unexpected payload shape: {message}")]
    Aggregation { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s: {body}")]
    RateLimited {
        retry_after_seconds: u64,
        body: String,
    },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Max retries ({max_retries}) exceeded")]
    MaxRetriesExceeded { max_retries: u32 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("Run cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a token error
    pub fn token(message: impl Into<String>) -> Self {
        Self::Token {
            message: message.into(),
        }
    }

    /// Create a first page error
    pub fn first_page(message: impl Into<String>) -> Self {
        Self::FirstPage {
            message: message.into(),
        }
    }

    /// Create a cursor decode error for the offending link
    pub fn cursor_decode(link: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CursorDecode {
            link: link.into(),
            message: message.into(),
        }
    }

    /// Create an aggregation error
    pub fn aggregation(message: impl Into<String>) -> Self {
        Self::Aggregation {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }
}

/// Result type alias for cursor-fanout
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Per-page failures
// ============================================================================

/// Why a single page could not be turned into records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("unexpected payload: {message}")]
    Payload { message: String },
}

/// A single page failure, tied to the URL that produced it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{url}: {failure}")]
pub struct FetchError {
    /// URL of the failed page
    pub url: String,
    /// What went wrong
    pub failure: FetchFailure,
}

impl FetchError {
    /// Create a fetch error
    pub fn new(url: impl Into<String>, failure: FetchFailure) -> Self {
        Self {
            url: url.into(),
            failure,
        }
    }

    /// Classify a crate error raised while fetching `url`
    pub fn from_error(url: impl Into<String>, error: Error) -> Self {
        let failure = match error {
            Error::HttpStatus { status, body } => FetchFailure::Status { status, body },
            Error::RateLimited { body, .. } => FetchFailure::Status { status: 429, body },
            Error::Timeout { timeout_ms } => FetchFailure::Timeout { timeout_ms },
            Error::Http(e) if e.is_timeout() => FetchFailure::Timeout { timeout_ms: 0 },
            Error::JsonParse(e) => FetchFailure::Payload {
                message: e.to_string(),
            },
            Error::Aggregation { message } => FetchFailure::Payload { message },
            other => FetchFailure::Transport {
                message: other.to_string(),
            },
        };
        Self::new(url, failure)
    }

    /// HTTP status, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match &self.failure {
            FetchFailure::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
