//! Output module for completed records and run statistics
//!
//! This module handles:
//! - The `RecordSink` interface the orchestrator streams records into
//! - JSON Lines, SQLite and in-memory sinks
//! - Fan-out to several sinks at once
//! - Loading and printing run statistics

mod jsonl;
mod memory;
mod sqlite_output;
pub mod stats;
mod traits;

pub use jsonl::JsonLinesSink;
pub use memory::MemorySink;
pub use sqlite_output::SqliteSink;
pub use stats::{load_run_statistics, load_statistics, print_statistics, CrawlStatistics};
pub use traits::{OutputError, OutputResult, RecordSink};

use crate::crawler::{CrawlReport, StageFailure};
use crate::types::BusinessRecord;

/// Forwards every call to each inner sink, in order
///
/// The first sink error stops the fan-out and is returned.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn RecordSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: Box<dyn RecordSink>) {
        self.sinks.push(sink);
    }

    pub fn with(mut self, sink: Box<dyn RecordSink>) -> Self {
        self.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl RecordSink for MultiSink {
    fn emit(&mut self, record: &BusinessRecord) -> OutputResult<()> {
        for sink in &mut self.sinks {
            sink.emit(record)?;
        }
        Ok(())
    }

    fn record_failure(&mut self, failure: &StageFailure) -> OutputResult<()> {
        for sink in &mut self.sinks {
            sink.record_failure(failure)?;
        }
        Ok(())
    }

    fn finalize(&mut self, report: &CrawlReport) -> OutputResult<()> {
        for sink in &mut self.sinks {
            sink.finalize(report)?;
        }
        Ok(())
    }
}
