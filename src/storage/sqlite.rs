//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::StageFailure;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{FailureRecord, RunRecord, RunStatus, StoredBusiness};
use crate::types::{BusinessRecord, Review};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, config_hash, category, location, status, pages_fetched";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path` and applies the schema
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, params![run_id], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn reviews_for(&self, business_id: i64) -> StorageResult<Vec<Review>> {
        let mut stmt = self.conn.prepare(
            "SELECT reviewer_name, reviewer_location, review_date FROM reviews
             WHERE business_id = ?1 ORDER BY position",
        )?;

        let reviews = stmt
            .query_map(params![business_id], |row| {
                Ok(Review {
                    reviewer_name: row.get(0)?,
                    reviewer_location: row.get(1)?,
                    review_date: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(reviews)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        category: row.get(4)?,
        location: row.get(5)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(6)?)
            .unwrap_or(RunStatus::Running),
        pages_fetched: row.get(7)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(
        &mut self,
        config_hash: &str,
        category: &str,
        location: &str,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, category, location, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                now,
                config_hash,
                category,
                location,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        pages_fetched: u32,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_fetched = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, pages_fetched, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Records =====

    fn insert_business(&mut self, run_id: i64, record: &BusinessRecord) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO businesses
             (run_id, name, rating, review_count, listing_url, website, harvested_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                record.business_name,
                record.business_rating,
                record.number_of_reviews as i64,
                record.business_yelp_url,
                record.business_website,
                now
            ],
        )?;

        let business_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO reviews
                 (business_id, position, reviewer_name, reviewer_location, review_date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (position, review) in record.reviews.iter().enumerate() {
                stmt.execute(params![
                    business_id,
                    position as i64,
                    review.reviewer_name,
                    review.reviewer_location,
                    review.review_date
                ])?;
            }
        }

        tx.commit()?;
        Ok(business_id)
    }

    fn list_businesses(&self, run_id: i64) -> StorageResult<Vec<StoredBusiness>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, rating, review_count, listing_url, website, harvested_at
             FROM businesses WHERE run_id = ?1 ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![run_id], |row| {
                let review_count: i64 = row.get(3)?;
                Ok(StoredBusiness {
                    id: row.get(0)?,
                    run_id,
                    harvested_at: row.get(6)?,
                    record: BusinessRecord {
                        business_name: row.get(1)?,
                        business_rating: row.get(2)?,
                        number_of_reviews: review_count as u64,
                        business_yelp_url: row.get(4)?,
                        business_website: row.get(5)?,
                        reviews: Vec::new(),
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|mut stored| {
                stored.record.reviews = self.reviews_for(stored.id)?;
                Ok(stored)
            })
            .collect()
    }

    fn insert_failure(&mut self, run_id: i64, failure: &StageFailure) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO failures (run_id, stage, url, business, message, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run_id,
                failure.stage.as_str(),
                failure.url,
                failure.business,
                failure.message,
                now
            ],
        )?;
        Ok(())
    }

    fn list_failures(&self, run_id: i64) -> StorageResult<Vec<FailureRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, stage, url, business, message, recorded_at
             FROM failures WHERE run_id = ?1 ORDER BY id",
        )?;

        let failures = stmt
            .query_map(params![run_id], |row| {
                Ok(FailureRecord {
                    id: row.get(0)?,
                    run_id: row.get(1)?,
                    stage: row.get(2)?,
                    url: row.get(3)?,
                    business: row.get(4)?,
                    message: row.get(5)?,
                    recorded_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(failures)
    }

    // ===== Statistics =====

    fn count_businesses(&self, run_id: i64) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM businesses WHERE run_id = ?1", run_id)
    }

    fn count_reviews(&self, run_id: i64) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM reviews r JOIN businesses b ON r.business_id = b.id
             WHERE b.run_id = ?1",
            run_id,
        )
    }

    fn count_websites(&self, run_id: i64) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM businesses WHERE run_id = ?1 AND website IS NOT NULL",
            run_id,
        )
    }

    fn count_failures_by_stage(&self, run_id: i64) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT stage, COUNT(*) FROM failures WHERE run_id = ?1
             GROUP BY stage ORDER BY stage",
        )?;

        let counts = stmt
            .query_map(params![run_id], |row| {
                let count: i64 = row.get(1)?;
                Ok((row.get::<_, String>(0)?, count as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}
