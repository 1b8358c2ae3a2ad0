//! Dataset exporters

use super::writer::JsonLinesWriter;
use crate::aggregate::Dataset;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Receives the final dataset of an environment run
pub trait DatasetExporter: Send + Sync {
    /// Persist `dataset` for `environment`, returning where it was written
    fn export(&self, environment: &str, dataset: &Dataset) -> Result<PathBuf>;
}

/// Writes `<output_dir>/<environment>_output.jsonl`
#[derive(Debug, Clone)]
pub struct JsonLinesExporter {
    output_dir: PathBuf,
}

impl JsonLinesExporter {
    /// Create an exporter writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Target directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Output path for an environment
    pub fn path_for(&self, environment: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_output.jsonl", output_stem(environment)))
    }
}

impl DatasetExporter for JsonLinesExporter {
    fn export(&self, environment: &str, dataset: &Dataset) -> Result<PathBuf> {
        if environment.trim().is_empty() {
            return Err(Error::output("environment name is empty"));
        }
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            Error::output(format!(
                "Failed to create output directory '{}': {e}",
                self.output_dir.display()
            ))
        })?;

        let path = self.path_for(environment);
        let mut writer = JsonLinesWriter::new(&path)?;
        writer.write_all(dataset.records())?;
        let rows = writer.close()?;

        info!("Wrote {rows} records for {environment} to {}", path.display());
        Ok(path)
    }
}

/// File-name stem for an environment's output
///
/// Characters outside `[A-Za-z0-9._-]` become `_` and leading dots are
/// dropped, so distinct names such as `a/b` and `a_b` share a stem.
pub fn output_stem(environment: &str) -> String {
    environment
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}
