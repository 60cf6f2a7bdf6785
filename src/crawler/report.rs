//! Stage failures and the end-of-run report

use crate::crawler::gateway::TransportError;
use crate::extract::ExtractError;
use crate::state::{CrawlPhase, TransitionError};
use crate::types::SearchQuery;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The fetch stage a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Search,
    Reviews,
    Detail,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Reviews => "reviews",
            Self::Detail => "detail",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a search page or record chain was abandoned
#[derive(Debug, Error)]
pub enum StageError {
    #[error("{stage} fetch failed: {source}")]
    Transport {
        stage: Stage,
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("{stage} payload from {url} could not be used: {source}")]
    Extract {
        stage: Stage,
        url: String,
        #[source]
        source: ExtractError,
    },

    #[error("{stage} request URL could not be built from '{input}': {source}")]
    Url {
        stage: Stage,
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{stage} stage out of order: {source}")]
    Transition {
        stage: Stage,
        url: String,
        #[source]
        source: TransitionError,
    },

    /// The chain's task ended without an outcome; attributed to its first stage
    #[error("{stage} {message} for {url}")]
    Task {
        stage: Stage,
        url: String,
        message: String,
    },
}

impl StageError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Transport { stage, .. }
            | Self::Extract { stage, .. }
            | Self::Url { stage, .. }
            | Self::Transition { stage, .. }
            | Self::Task { stage, .. } => *stage,
        }
    }

    /// URL of the failing request (or the input it was built from)
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. }
            | Self::Extract { url, .. }
            | Self::Transition { url, .. }
            | Self::Task { url, .. } => url,
            Self::Url { input, .. } => input,
        }
    }

    /// True when the payload arrived but did not have the expected structure
    pub fn is_malformed_payload(&self) -> bool {
        matches!(self, Self::Extract { .. })
    }
}

/// A reportable record of one abandoned page or chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub url: String,
    /// Business the chain was working on; `None` for search pages
    pub business: Option<String>,
    pub message: String,
}

impl StageFailure {
    pub fn from_error(error: &StageError, business: Option<String>) -> Self {
        Self {
            stage: error.stage(),
            url: error.url().to_string(),
            business,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.business {
            Some(business) => write!(f, "[{}] {} ({}): {}", self.stage, business, self.url, self.message),
            None => write!(f, "[{}] {}: {}", self.stage, self.url, self.message),
        }
    }
}

/// Summary of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub query: SearchQuery,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub phase: CrawlPhase,

    /// Search pages successfully fetched and extracted
    pub pages_fetched: u32,

    /// Organic hits found across all pages
    pub hits_found: u64,

    /// Chains spawned (one per organic hit with a usable listing URL)
    pub chains_started: u64,

    /// Records that reached `Complete` and were handed to the sink
    pub records_emitted: u64,

    /// Records emitted with a resolved website
    pub websites_found: u64,

    /// Chains that were abandoned, in completion order
    pub failures: Vec<StageFailure>,

    /// The search page failure that stopped pagination, if any
    pub aborted_by: Option<StageFailure>,
}

impl CrawlReport {
    pub fn new(query: SearchQuery) -> Self {
        Self {
            query,
            started_at: Utc::now(),
            finished_at: None,
            phase: CrawlPhase::AwaitingSearchPage,
            pages_fetched: 0,
            hits_found: 0,
            chains_started: 0,
            records_emitted: 0,
            websites_found: 0,
            failures: Vec::new(),
            aborted_by: None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted_by.is_some()
    }

    pub fn chains_failed(&self) -> u64 {
        self.failures
            .iter()
            .filter(|failure| failure.stage != Stage::Search)
            .count() as u64
    }

    /// Duration of the run in whole seconds, once finished
    pub fn duration_seconds(&self) -> Option<u64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds().max(0) as u64)
    }
}
