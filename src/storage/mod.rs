//! Storage module for persisting harvested records
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Run tracking with start/finish timestamps and final status
//! - Business records with their review samples
//! - Failed search pages and chains

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::types::BusinessRecord;
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub category: String,
    pub location: String,
    pub status: RunStatus,
    pub pages_fetched: u32,
}

/// A business record as stored, with its row ID
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBusiness {
    pub id: i64,
    pub run_id: i64,
    pub harvested_at: String,
    pub record: BusinessRecord,
}

/// Represents a recorded stage failure
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub id: i64,
    pub run_id: i64,
    pub stage: String,
    pub url: String,
    pub business: Option<String>,
    pub message: String,
    pub recorded_at: String,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Aborted,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "aborted" => Some(Self::Aborted),
            _ => None,
        }
    }
}
