/// Phases of the overall page-to-page crawl
use std::fmt;

/// Where the orchestrator is in its search-page loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// The first search page has been requested
    AwaitingSearchPage,

    /// Hits from the latest page are being dispatched into chains
    ProcessingHits,

    /// A follow-up page has been requested with an advanced cursor
    AwaitingNextSearchPage,

    /// Pagination is exhausted (or the page cap was reached)
    Done,

    /// A search page failed; no further pages can be discovered
    Aborted,
}

impl CrawlPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Returns true if `next` is a legal successor of `self`
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        match (self, next) {
            (Self::AwaitingSearchPage | Self::AwaitingNextSearchPage, Self::ProcessingHits) => {
                true
            }
            (Self::AwaitingSearchPage | Self::AwaitingNextSearchPage, Self::Aborted) => true,
            (Self::ProcessingHits, Self::AwaitingNextSearchPage | Self::Done) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingSearchPage => "awaiting_search_page",
            Self::ProcessingHits => "processing_hits",
            Self::AwaitingNextSearchPage => "awaiting_next_search_page",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
