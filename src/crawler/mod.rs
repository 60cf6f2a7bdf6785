//! Crawler module for search pagination and record chains
//!
//! This module contains the core crawling logic, including:
//! - The fetch gateway with concurrency cap, pacing and retries
//! - Site URL construction for search, review and listing requests
//! - Per-hit record chains (review feed, then listing page)
//! - Pagination decisions and overall crawl coordination

mod chain;
mod coordinator;
mod gateway;
mod pagination;
mod report;
mod site;

pub use chain::{run_chain, ChainOutcome};
pub use coordinator::{run_crawl, Coordinator};
pub use gateway::{
    build_http_client, FetchGateway, FetchRequest, GatewaySettings, HttpGateway, TransportError,
};
pub use pagination::{has_next_page, next_cursor};
pub use report::{CrawlReport, Stage, StageError, StageFailure};
pub use site::SiteSettings;
