//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the page-to-page crawl loop:
//! - Fetching a search page and extracting hits and navigation
//! - Spawning one record chain task per organic hit
//! - Streaming finished records to the sink as chains report back
//! - Advancing the cursor while the feed reports more results
//! - Draining every in-flight chain before the run ends

use crate::config::Config;
use crate::crawler::chain::{run_chain, ChainOutcome};
use crate::crawler::gateway::{FetchGateway, HttpGateway};
use crate::crawler::pagination::{check_navigation, has_next_page, next_cursor};
use crate::crawler::report::{CrawlReport, Stage, StageError, StageFailure};
use crate::crawler::site::SiteSettings;
use crate::extract::{parse_search_page, SearchPage};
use crate::output::RecordSink;
use crate::state::{CrawlPhase, RecordAccumulator};
use crate::types::SearchQuery;
use crate::HarvestError;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Main crawler coordinator structure
pub struct Coordinator {
    site: Arc<SiteSettings>,
    gateway: Arc<dyn FetchGateway>,
    max_pages: Option<u32>,
}

impl Coordinator {
    /// Creates a coordinator over an arbitrary gateway
    pub fn new(site: SiteSettings, gateway: Arc<dyn FetchGateway>) -> Self {
        Self {
            site: Arc::new(site),
            gateway,
            max_pages: None,
        }
    }

    /// Builds a coordinator with the reqwest-backed gateway from configuration
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let site = SiteSettings::from_config(&config.site)?;
        let gateway = HttpGateway::from_config(&config.crawler, &config.user_agent)?;
        let max_pages = Some(config.crawler.max_pages).filter(|&pages| pages > 0);

        Ok(Self::new(site, Arc::new(gateway)).with_max_pages(max_pages))
    }

    /// Caps the number of search pages fetched in one run
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn site(&self) -> &SiteSettings {
        &self.site
    }

    /// Runs a crawl for `query`, handing each finished record to `sink`
    ///
    /// Returns `Err` only when the sink itself fails. Fetch and payload
    /// failures are reported through the returned `CrawlReport`: a chain
    /// failure is recorded and skipped, while a search page failure stops
    /// pagination and marks the run as aborted once in-flight chains drain.
    pub async fn run(
        &self,
        query: SearchQuery,
        sink: &mut dyn RecordSink,
    ) -> Result<CrawlReport, HarvestError> {
        tracing::info!(
            "Starting crawl for '{}' in '{}'",
            query.category,
            query.location
        );

        let mut report = CrawlReport::new(query.clone());
        let (tx, mut rx) = mpsc::unbounded_channel::<ChainOutcome>();
        let mut query = query;

        loop {
            // AwaitingSearchPage / AwaitingNextSearchPage
            let page = match self.fetch_search_page(&query).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!("Search page failed at cursor {}: {}", query.cursor, e);
                    let failure = StageFailure::from_error(&e, None);
                    sink.record_failure(&failure)?;
                    report.aborted_by = Some(failure);
                    advance(&mut report, CrawlPhase::Aborted);
                    break;
                }
            };

            // ProcessingHits
            advance(&mut report, CrawlPhase::ProcessingHits);
            report.pages_fetched += 1;
            report.hits_found += page.hits.len() as u64;
            tracing::info!(
                "Search page {} (cursor {}): {} hits, {} of {} results",
                report.pages_fetched,
                query.cursor,
                page.hits.len(),
                page.navigation.start_result,
                page.navigation.total_results
            );

            for hit in page.hits {
                let listing_url = match self.site.listing_url(&hit.detail_page_url) {
                    Ok(url) => url,
                    Err(source) => {
                        let error = StageError::Url {
                            stage: Stage::Search,
                            input: hit.detail_page_url.clone(),
                            source,
                        };
                        tracing::error!("Skipping {}: {}", hit.name, error);
                        let failure = StageFailure::from_error(&error, Some(hit.name.clone()));
                        sink.record_failure(&failure)?;
                        report.failures.push(failure);
                        continue;
                    }
                };

                let accumulator = RecordAccumulator::from_hit(&hit, listing_url);
                let gateway = Arc::clone(&self.gateway);
                let site = Arc::clone(&self.site);
                let tx = tx.clone();

                report.chains_started += 1;
                let business = accumulator.business_name().to_string();
                let listing_url = accumulator.business_yelp_url().to_string();
                let chain = tokio::spawn(async move {
                    run_chain(gateway.as_ref(), &site, &hit, accumulator).await
                });
                tokio::spawn(async move {
                    // A panicking chain still reports back, as a failure
                    let result = chain.await.unwrap_or_else(|e| {
                        Err(StageError::Task {
                            stage: Stage::Reviews,
                            url: listing_url,
                            message: if e.is_panic() {
                                "chain task panicked".to_string()
                            } else {
                                "chain task was cancelled".to_string()
                            },
                        })
                    });
                    // The receiver outlives every sender; a send error means the run was dropped
                    let _ = tx.send(ChainOutcome { business, result });
                });
            }

            // Forward whatever finished while this page was being handled
            while let Ok(outcome) = rx.try_recv() {
                handle_outcome(outcome, &mut report, sink)?;
            }

            if !has_next_page(&page.navigation) {
                tracing::info!("Pagination exhausted after {} pages", report.pages_fetched);
                advance(&mut report, CrawlPhase::Done);
                break;
            }

            if let Some(max_pages) = self.max_pages {
                if report.pages_fetched >= max_pages {
                    tracing::warn!(
                        "Stopping after {} search pages (max-pages); more results are available",
                        max_pages
                    );
                    advance(&mut report, CrawlPhase::Done);
                    break;
                }
            }

            let Some(cursor) = next_cursor(&page.navigation) else {
                tracing::warn!("Next search offset overflows; stopping pagination");
                advance(&mut report, CrawlPhase::Done);
                break;
            };
            query = query.with_cursor(cursor);
            advance(&mut report, CrawlPhase::AwaitingNextSearchPage);
        }

        // No more chains will be spawned; wait for the ones in flight
        drop(tx);
        while let Some(outcome) = rx.recv().await {
            handle_outcome(outcome, &mut report, sink)?;
        }

        report.finished_at = Some(Utc::now());
        sink.finalize(&report)?;

        tracing::info!(
            "Crawl {}: {} pages, {} records, {} failed chains",
            report.phase,
            report.pages_fetched,
            report.records_emitted,
            report.chains_failed()
        );

        Ok(report)
    }

    async fn fetch_search_page(&self, query: &SearchQuery) -> Result<SearchPage, StageError> {
        let request = self.site.search_request(query);

        let body = self
            .gateway
            .fetch(&request)
            .await
            .map_err(|source| StageError::Transport {
                stage: Stage::Search,
                url: request.url.clone(),
                source,
            })?;

        parse_search_page(&body)
            .and_then(|page| {
                check_navigation(&page.navigation, query.cursor)?;
                Ok(page)
            })
            .map_err(|source| StageError::Extract {
                stage: Stage::Search,
                url: request.url.clone(),
                source,
            })
    }
}

/// Records a phase change
fn advance(report: &mut CrawlReport, next: CrawlPhase) {
    debug_assert!(
        report.phase.can_transition_to(next),
        "invalid crawl transition {} -> {}",
        report.phase,
        next
    );
    tracing::trace!("Crawl phase {} -> {}", report.phase, next);
    report.phase = next;
}

fn handle_outcome(
    outcome: ChainOutcome,
    report: &mut CrawlReport,
    sink: &mut dyn RecordSink,
) -> Result<(), HarvestError> {
    match outcome.result {
        Ok(record) => {
            tracing::debug!("Completed record for {}", record.business_name);
            if record.business_website.is_some() {
                report.websites_found += 1;
            }
            sink.emit(&record)?;
            report.records_emitted += 1;
        }
        Err(e) => {
            tracing::error!(
                "Chain for {} failed at {} stage ({}): {}",
                outcome.business,
                e.stage(),
                e.url(),
                e
            );
            let failure = StageFailure::from_error(&e, Some(outcome.business));
            sink.record_failure(&failure)?;
            report.failures.push(failure);
        }
    }
    Ok(())
}

/// Runs a complete crawl from configuration
///
/// # Example
///
/// ```no_run
/// use listing_harvest::config::load_config;
/// use listing_harvest::crawler::run_crawl;
/// use listing_harvest::output::MemorySink;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let mut sink = MemorySink::new();
/// let report = run_crawl(&config, &mut sink).await?;
/// println!("{} records", report.records_emitted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    sink: &mut dyn RecordSink,
) -> Result<CrawlReport, HarvestError> {
    let coordinator = Coordinator::from_config(config)?;
    let query = SearchQuery::new(&config.search.category, &config.search.location);
    coordinator.run(query, sink).await
}
