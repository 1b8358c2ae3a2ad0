// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # cursor-fanout
//!
//! Concurrent exporter for search APIs that paginate with an opaque cursor.
//!
//! The first page of a query carries a `nextPage` link whose last path
//! segment is a base64 cursor (`sessionId,currentRow,maxRow,flag`). Instead
//! of following links one at a time, the cursor is decoded, every remaining
//! page link is generated up front, and the pages are fetched by a bounded
//! worker pool and merged into one dataset.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cursor_fanout::auth::AccessKeyTokenProvider;
//! use cursor_fanout::config::ExportConfig;
//! use cursor_fanout::engine::{EngineConfig, ExportEngine};
//! use cursor_fanout::http::HttpClient;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = ExportConfig::from_file("export.yaml")?;
//! let client = HttpClient::new()?;
//! let tokens = AccessKeyTokenProvider::new(client.clone(), &config.api_base_url()?);
//! let engine = ExportEngine::new(
//!     Arc::new(client),
//!     Arc::new(tokens),
//!     EngineConfig::from_export_config(&config)?,
//! )?;
//!
//! for report in engine.run_all(&config.environments, &CancellationToken::new()).await {
//!     println!("{}", report.summary());
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!  token ─► first page ─► CursorCodec ─► LinkEnumerator ─► ConcurrentFetcher ─► ResultAggregator
//!                │                                          (N workers)              │
//!                └── no nextPage ──────────────────────────────────────────────────► Dataset
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Token provider
pub mod auth;

/// HTTP client with optional retry and rate limiting
pub mod http;

/// Cursor codec and link enumeration
pub mod pagination;

/// Bounded concurrent page fetching
pub mod fetch;

/// Merging pages into a dataset
pub mod aggregate;

/// Per-environment export orchestration
pub mod engine;

/// Export configuration
pub mod config;

/// Dataset exporters
pub mod output;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, FetchError, FetchFailure, Result};
pub use types::*;

// Re-export commonly used types
pub use aggregate::{Dataset, ResultAggregator};
pub use engine::{EngineConfig, EnvironmentOutcome, EnvironmentReport, ExportEngine};
pub use fetch::ConcurrentFetcher;
pub use pagination::{CursorCodec, LinkEnumerator, PaginationCursor};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
