//! HTTP client module
//!
//! The page fetcher collaborator: one GET per page with the token and JSON
//! headers, a per-request timeout, and optional rate limiting.
//!
//! # Features
//!
//! - **Timeouts**: every request carries one; expiry is a page failure
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Retries**: off by default, opt in with backoff if the API needs it

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
