//! JSON Lines record sink
//!
//! Writes one JSON object per completed record, flushed per line so a
//! partially finished run still leaves a readable file.

use crate::crawler::CrawlReport;
use crate::output::traits::{OutputResult, RecordSink};
use crate::types::BusinessRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sink writing records to a `.jsonl` file
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl JsonLinesSink {
    /// Creates (or truncates) the file at `path`
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = File::create(path)?;
        Ok(Self::with_file(path, file))
    }

    /// Opens the file at `path` for appending, creating it if needed
    pub fn append(path: &Path) -> OutputResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::with_file(path, file))
    }

    fn with_file(path: &Path, file: File) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records written so far
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl RecordSink for JsonLinesSink {
    fn emit(&mut self, record: &BusinessRecord) -> OutputResult<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    fn finalize(&mut self, _report: &CrawlReport) -> OutputResult<()> {
        self.writer.flush()?;
        tracing::info!("Wrote {} records to {}", self.written, self.path.display());
        Ok(())
    }
}
