/// Record chain state definitions
///
/// Every organic search hit spawns one chain, which must pass through its
/// stages strictly in order.
use std::fmt;
use thiserror::Error;

/// Represents the current state of a record chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainState {
    // ===== Active States =====
    /// Hit was extracted from a search page; nothing fetched yet
    HitFound,

    /// Review feed request has been issued
    AwaitingReviews,

    /// Listing page request has been issued
    AwaitingDetail,

    // ===== Terminal States =====
    /// All three stages ran; the record has been emitted
    Complete,

    /// A fetch or extraction failed; the chain was abandoned
    Failed,
}

/// Raised when a chain is asked to skip or repeat a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid chain transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: ChainState,
    pub to: ChainState,
}

impl ChainState {
    /// Returns true if no further processing will happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Returns true if the chain is still running
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if moving from `self` to `next` keeps strict stage order
    ///
    /// Any active state may fail; the happy path only ever moves one step forward.
    pub fn can_transition_to(&self, next: ChainState) -> bool {
        match (self, next) {
            (Self::HitFound, Self::AwaitingReviews) => true,
            (Self::AwaitingReviews, Self::AwaitingDetail) => true,
            (Self::AwaitingDetail, Self::Complete) => true,
            (from, Self::Failed) => from.is_active(),
            _ => false,
        }
    }

    /// Checks a transition, returning the target state on success
    pub fn transition(self, next: ChainState) -> Result<ChainState, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HitFound => "hit_found",
            Self::AwaitingReviews => "awaiting_reviews",
            Self::AwaitingDetail => "awaiting_detail",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ChainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
