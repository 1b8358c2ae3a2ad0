//! Output module
//!
//! The downstream exporter collaborator: receives a finished [`Dataset`] and
//! serializes it.
//!
//! [`Dataset`]: crate::aggregate::Dataset

mod exporter;
mod writer;

pub use exporter::{output_stem, DatasetExporter, JsonLinesExporter};
pub use writer::JsonLinesWriter;
