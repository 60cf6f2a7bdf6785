//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::StageFailure;
use crate::storage::{FailureRecord, RunRecord, RunStatus, StoredBusiness};
use crate::types::BusinessRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run in the `running` state
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, category: &str, location: &str)
        -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Records the final status, page count and finish timestamp of a run
    fn finish_run(&mut self, run_id: i64, status: RunStatus, pages_fetched: u32)
        -> StorageResult<()>;

    // ===== Records =====

    /// Stores a completed record and its reviews
    ///
    /// Every call adds a row, even for a listing URL already stored in the run.
    fn insert_business(&mut self, run_id: i64, record: &BusinessRecord) -> StorageResult<i64>;

    /// Lists stored records for a run, reviews included, in insertion order
    fn list_businesses(&self, run_id: i64) -> StorageResult<Vec<StoredBusiness>>;

    /// Records an abandoned search page or chain
    fn insert_failure(&mut self, run_id: i64, failure: &StageFailure) -> StorageResult<()>;

    /// Lists failures recorded for a run
    fn list_failures(&self, run_id: i64) -> StorageResult<Vec<FailureRecord>>;

    // ===== Statistics =====

    fn count_businesses(&self, run_id: i64) -> StorageResult<u64>;

    fn count_reviews(&self, run_id: i64) -> StorageResult<u64>;

    /// Counts records of a run that resolved a website
    fn count_websites(&self, run_id: i64) -> StorageResult<u64>;

    /// Gets failure counts per stage for a run
    fn count_failures_by_stage(&self, run_id: i64) -> StorageResult<Vec<(String, u64)>>;
}
