//! Per-chain record accumulator
//!
//! A `RecordAccumulator` is created from a search hit and consumed stage by
//! stage. Each stage method takes `self` by value, so a chain can never hold
//! on to a stale copy, and the embedded `ChainState` rejects out-of-order calls.

use crate::state::{ChainState, TransitionError};
use crate::types::{BusinessRecord, Review, SearchHit};

/// Partially-extracted business record owned by exactly one chain
#[derive(Debug, Clone, PartialEq)]
pub struct RecordAccumulator {
    state: ChainState,
    business_name: String,
    business_rating: f64,
    number_of_reviews: u64,
    business_yelp_url: String,
    business_website: Option<String>,
    reviews: Vec<Review>,
}

impl RecordAccumulator {
    /// Stage 1: seeds the record from a search hit
    ///
    /// `listing_url` is the hit's listing path resolved against the site base URL.
    pub fn from_hit(hit: &SearchHit, listing_url: impl Into<String>) -> Self {
        Self {
            state: ChainState::HitFound,
            business_name: hit.name.clone(),
            business_rating: hit.rating,
            number_of_reviews: hit.review_count,
            business_yelp_url: listing_url.into(),
            business_website: None,
            reviews: Vec::new(),
        }
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn business_name(&self) -> &str {
        &self.business_name
    }

    pub fn business_yelp_url(&self) -> &str {
        &self.business_yelp_url
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    /// Marks the review feed request as issued
    pub fn await_reviews(mut self) -> Result<Self, TransitionError> {
        self.state = self.state.transition(ChainState::AwaitingReviews)?;
        Ok(self)
    }

    /// Stage 2: merges the review sample and moves on to the listing page
    pub fn with_reviews(mut self, reviews: Vec<Review>) -> Result<Self, TransitionError> {
        self.state = self.state.transition(ChainState::AwaitingDetail)?;
        self.reviews = reviews;
        Ok(self)
    }

    /// Stage 3: merges the website (if any) and completes the record
    pub fn complete(mut self, website: Option<String>) -> Result<BusinessRecord, TransitionError> {
        self.state = self.state.transition(ChainState::Complete)?;
        self.business_website = website;

        Ok(BusinessRecord {
            business_name: self.business_name,
            business_rating: self.business_rating,
            number_of_reviews: self.number_of_reviews,
            business_yelp_url: self.business_yelp_url,
            business_website: self.business_website,
            reviews: self.reviews,
        })
    }
}
