//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `ChainState`: Tracks one record chain (search hit → reviews → detail page)
//! - `CrawlPhase`: Tracks the overall page-to-page crawl
//! - `RecordAccumulator`: Carries a record's partial fields through its chain

mod accumulator;
mod chain_state;
mod crawl_phase;

// Re-export main types
pub use accumulator::RecordAccumulator;
pub use chain_state::{ChainState, TransitionError};
pub use crawl_phase::CrawlPhase;
