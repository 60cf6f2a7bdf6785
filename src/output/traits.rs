//! Record sink trait and error types
//!
//! This module defines the trait interface for record sinks and
//! associated error types.

use crate::crawler::{CrawlReport, StageFailure};
use crate::storage::StorageError;
use crate::types::BusinessRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for completed business records
///
/// The orchestrator calls `emit` once per completed record, in completion
/// order, from a single task. `record_failure` receives every abandoned
/// search page or chain. `finalize` is called exactly once, after every
/// in-flight chain has reported.
pub trait RecordSink: Send {
    /// Accepts one completed record
    fn emit(&mut self, record: &BusinessRecord) -> OutputResult<()>;

    /// Accepts one abandoned page or chain
    fn record_failure(&mut self, _failure: &StageFailure) -> OutputResult<()> {
        Ok(())
    }

    /// Flushes and closes the output once the run has ended
    fn finalize(&mut self, _report: &CrawlReport) -> OutputResult<()> {
        Ok(())
    }
}
