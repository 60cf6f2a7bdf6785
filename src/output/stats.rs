//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! run statistics from the storage layer.

use crate::storage::{RunRecord, Storage, StorageResult};

/// Run statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// The run these statistics describe
    pub run: RunRecord,

    /// Number of business records stored
    pub businesses: u64,

    /// Number of review samples stored
    pub reviews: u64,

    /// Number of businesses with a resolved website
    pub websites: u64,

    /// Failure counts per stage
    pub failures_by_stage: Vec<(String, u64)>,
}

impl CrawlStatistics {
    pub fn total_failures(&self) -> u64 {
        self.failures_by_stage.iter().map(|(_, count)| count).sum()
    }

    /// Share of businesses with a website, as a percentage
    pub fn website_rate(&self) -> f64 {
        if self.businesses == 0 {
            return 0.0;
        }
        (self.websites as f64 / self.businesses as f64) * 100.0
    }

    pub fn average_reviews(&self) -> f64 {
        if self.businesses == 0 {
            return 0.0;
        }
        self.reviews as f64 / self.businesses as f64
    }
}

/// Loads statistics for the most recent run
///
/// Returns `Ok(None)` if the database holds no runs yet.
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<Option<CrawlStatistics>> {
    match storage.get_latest_run()? {
        Some(run) => load_run_statistics(storage, run.id).map(Some),
        None => Ok(None),
    }
}

/// Loads statistics for a specific run
pub fn load_run_statistics(storage: &dyn Storage, run_id: i64) -> StorageResult<CrawlStatistics> {
    let run = storage.get_run(run_id)?;

    Ok(CrawlStatistics {
        businesses: storage.count_businesses(run.id)?,
        reviews: storage.count_reviews(run.id)?,
        websites: storage.count_websites(run.id)?,
        failures_by_stage: storage.count_failures_by_stage(run.id)?,
        run,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    let run = &stats.run;
    println!("=== Harvest Statistics ===\n");

    println!("Run {}:", run.id);
    println!("  Search: '{}' in '{}'", run.category, run.location);
    println!("  Status: {}", run.status.to_db_string());
    println!("  Started: {}", run.started_at);
    if let Some(finished) = &run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!("  Search pages fetched: {}", run.pages_fetched);
    println!();

    println!("Records:");
    println!("  Businesses: {}", stats.businesses);
    println!(
        "  Reviews: {} ({:.1} per business)",
        stats.reviews,
        stats.average_reviews()
    );
    println!(
        "  Websites found: {} ({:.1}%)",
        stats.websites,
        stats.website_rate()
    );
    println!();

    if !stats.failures_by_stage.is_empty() {
        println!("Failures by Stage:");
        for (stage, count) in &stats.failures_by_stage {
            println!("  {}: {}", stage, count);
        }
        println!();
    }

    println!("Total failures: {}", stats.total_failures());
}
