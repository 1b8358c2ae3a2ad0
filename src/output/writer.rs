//! JSON Lines file writer
//!
//! Writes one JSON record per line through a buffered file handle.

use crate::error::{Error, Result};
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Buffered JSON Lines writer
pub struct JsonLinesWriter {
    writer: BufWriter<File>,
    rows_written: usize,
}

impl JsonLinesWriter {
    /// Create (or truncate) the file at `path`
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::Output {
            message: format!("Failed to create file '{}': {e}", path.display()),
        })?;

        Ok(Self {
            writer: BufWriter::new(file),
            rows_written: 0,
        })
    }

    /// Write one record as a line
    pub fn write(&mut self, record: &Value) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.rows_written += 1;
        Ok(())
    }

    /// Write every record in order
    pub fn write_all<'a>(&mut self, records: impl IntoIterator<Item = &'a Value>) -> Result<()> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    /// Get the number of rows written so far
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush buffered lines and close the file
    pub fn close(mut self) -> Result<usize> {
        self.writer.flush().map_err(|e| Error::Output {
            message: format!("Failed to flush output: {e}"),
        })?;
        Ok(self.rows_written)
    }
}

impl std::fmt::Debug for JsonLinesWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesWriter")
            .field("rows_written", &self.rows_written)
            .finish_non_exhaustive()
    }
}
