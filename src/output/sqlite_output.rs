//! SQLite-based record sink
//!
//! This module provides a sink that records each completed business,
//! each failure and the final run status to the storage backend.

use crate::crawler::{CrawlReport, StageFailure};
use crate::output::traits::{OutputResult, RecordSink};
use crate::storage::{RunStatus, SqliteStorage, Storage};
use crate::types::{BusinessRecord, SearchQuery};

/// SQLite-based record sink
///
/// One sink corresponds to one row in `runs`. The run is created in the
/// `running` state and closed by `finalize`.
pub struct SqliteSink {
    storage: SqliteStorage,
    run_id: i64,
}

impl SqliteSink {
    /// Opens a new run in `storage` for `query`
    pub fn start(
        mut storage: SqliteStorage,
        config_hash: &str,
        query: &SearchQuery,
    ) -> OutputResult<Self> {
        let run_id = storage.create_run(config_hash, &query.category, &query.location)?;
        tracing::info!("Recording to database as run {}", run_id);
        Ok(Self { storage, run_id })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn into_storage(self) -> SqliteStorage {
        self.storage
    }
}

impl RecordSink for SqliteSink {
    fn emit(&mut self, record: &BusinessRecord) -> OutputResult<()> {
        self.storage.insert_business(self.run_id, record)?;
        Ok(())
    }

    fn record_failure(&mut self, failure: &StageFailure) -> OutputResult<()> {
        self.storage.insert_failure(self.run_id, failure)?;
        Ok(())
    }

    fn finalize(&mut self, report: &CrawlReport) -> OutputResult<()> {
        let status = if report.is_aborted() {
            RunStatus::Aborted
        } else {
            RunStatus::Completed
        };

        self.storage
            .finish_run(self.run_id, status, report.pages_fetched)?;
        tracing::info!("Run {} marked {}", self.run_id, status.to_db_string());
        Ok(())
    }
}
