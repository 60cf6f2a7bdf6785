//! In-memory record sink

use crate::crawler::{CrawlReport, StageFailure};
use crate::output::traits::{OutputResult, RecordSink};
use crate::types::BusinessRecord;

/// Collects records and failures in memory, in the order they arrive
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<BusinessRecord>,
    failures: Vec<StageFailure>,
    finalized: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[BusinessRecord] {
        &self.records
    }

    pub fn failures(&self) -> &[StageFailure] {
        &self.failures
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn into_records(self) -> Vec<BusinessRecord> {
        self.records
    }
}

impl RecordSink for MemorySink {
    fn emit(&mut self, record: &BusinessRecord) -> OutputResult<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn record_failure(&mut self, failure: &StageFailure) -> OutputResult<()> {
        self.failures.push(failure.clone());
        Ok(())
    }

    fn finalize(&mut self, _report: &CrawlReport) -> OutputResult<()> {
        self.finalized = true;
        Ok(())
    }
}
