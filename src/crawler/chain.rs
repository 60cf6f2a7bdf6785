//! Record chain: review feed, then listing page, then a finished record
//!
//! One chain runs per organic search hit, as its own task. It owns its
//! accumulator outright and shares nothing with other chains except the
//! read-only site settings and the gateway.

use crate::crawler::gateway::{FetchGateway, FetchRequest};
use crate::crawler::report::{Stage, StageError};
use crate::crawler::site::SiteSettings;
use crate::extract::{extract_reviews, extract_website, parse_json};
use crate::state::RecordAccumulator;
use crate::types::{BusinessRecord, SearchHit};

/// What a finished chain reports back to the orchestrator
#[derive(Debug)]
pub struct ChainOutcome {
    pub business: String,
    pub result: Result<BusinessRecord, StageError>,
}

/// Drives one chain from `HitFound` to `Complete`
///
/// Exactly one review feed request and one listing page request are issued,
/// in that order. Any transport or payload failure abandons the chain.
pub async fn run_chain(
    gateway: &dyn FetchGateway,
    site: &SiteSettings,
    hit: &SearchHit,
    accumulator: RecordAccumulator,
) -> Result<BusinessRecord, StageError> {
    // HitFound -> AwaitingReviews
    let review_request = site
        .review_request(&hit.business_id)
        .map_err(|source| StageError::Url {
            stage: Stage::Reviews,
            input: hit.business_id.clone(),
            source,
        })?;

    let accumulator = accumulator
        .await_reviews()
        .map_err(|source| StageError::Transition {
            stage: Stage::Reviews,
            url: review_request.url.clone(),
            source,
        })?;

    tracing::debug!("Fetching reviews for {}", accumulator.business_name());
    let body = gateway
        .fetch(&review_request)
        .await
        .map_err(|source| StageError::Transport {
            stage: Stage::Reviews,
            url: review_request.url.clone(),
            source,
        })?;

    // AwaitingReviews -> AwaitingDetail
    let reviews = parse_json(&body)
        .and_then(|payload| extract_reviews(&payload, site.comments_limit()))
        .map_err(|source| StageError::Extract {
            stage: Stage::Reviews,
            url: review_request.url.clone(),
            source,
        })?;

    let accumulator = accumulator
        .with_reviews(reviews)
        .map_err(|source| StageError::Transition {
            stage: Stage::Reviews,
            url: review_request.url.clone(),
            source,
        })?;

    let detail_request = FetchRequest::get(accumulator.business_yelp_url());
    tracing::debug!(
        "Fetching listing page for {}: {}",
        accumulator.business_name(),
        detail_request.url
    );
    let markup = gateway
        .fetch(&detail_request)
        .await
        .map_err(|source| StageError::Transport {
            stage: Stage::Detail,
            url: detail_request.url.clone(),
            source,
        })?;

    // AwaitingDetail -> Complete
    let website = extract_website(&markup, site.redirect_prefix());
    if website.is_none() {
        tracing::debug!("No website link on {}", detail_request.url);
    }

    accumulator
        .complete(website)
        .map_err(|source| StageError::Transition {
            stage: Stage::Detail,
            url: detail_request.url.clone(),
            source,
        })
}
