//! Search page extraction
//!
//! A search page carries a single heterogeneous component list at
//! `searchPageProps.mainContentComponentsListProps`. Business entries carry a
//! `bizId` and a `searchResultBusiness` object; the pagination widget is the
//! entry tagged `"type": "pagination"`.

use crate::extract::{parse_json, ExtractError, ExtractResult};
use crate::types::{NavigationInfo, SearchHit};
use serde::Deserialize;
use serde_json::Value;

const CONTENT_LIST: &str = "searchPageProps.mainContentComponentsListProps";

/// Everything the orchestrator needs from one search page
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub hits: Vec<SearchHit>,
    pub navigation: NavigationInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBusiness {
    name: String,
    rating: f64,
    review_count: u64,
    business_url: String,
}

/// Decodes a search response body and extracts both hits and navigation
pub fn parse_search_page(body: &str) -> ExtractResult<SearchPage> {
    let payload = parse_json(body)?;
    Ok(SearchPage {
        hits: extract_search_hits(&payload)?,
        navigation: extract_navigation(&payload)?,
    })
}

/// Extracts organic business hits in server order
///
/// An entry is kept only if it has a `bizId` and is not flagged as an
/// advertisement. Entries without `bizId` (headers, widgets, the pagination
/// block) are skipped without inspection.
pub fn extract_search_hits(payload: &Value) -> ExtractResult<Vec<SearchHit>> {
    let mut hits = Vec::new();

    for (index, entry) in content_components(payload)?.iter().enumerate() {
        let Some(raw_id) = entry.get("bizId") else {
            continue;
        };

        let business_id = raw_id
            .as_str()
            .ok_or_else(|| {
                ExtractError::invalid(format!("{CONTENT_LIST}[{index}].bizId"), "is not a string")
            })?
            .to_string();

        let business = entry
            .get("searchResultBusiness")
            .ok_or_else(|| {
                ExtractError::missing(format!("{CONTENT_LIST}[{index}].searchResultBusiness"))
            })?;

        let is_advertisement = business
            .get("isAd")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if is_advertisement {
            tracing::trace!("Skipping advertisement {}", business_id);
            continue;
        }

        let raw: RawBusiness = serde_json::from_value(business.clone()).map_err(|e| {
            ExtractError::invalid(format!("{CONTENT_LIST}[{index}].searchResultBusiness"), e)
        })?;

        hits.push(SearchHit {
            business_id,
            is_advertisement,
            name: raw.name,
            rating: raw.rating,
            review_count: raw.review_count,
            detail_page_url: raw.business_url,
        });
    }

    Ok(hits)
}

/// Extracts the pagination counters from a search page
///
/// A page without a pagination block is malformed; this is distinct from the
/// normal last-page case, which is decided from the counters themselves.
pub fn extract_navigation(payload: &Value) -> ExtractResult<NavigationInfo> {
    let entry = content_components(payload)?
        .iter()
        .find(|entry| entry.get("type").and_then(Value::as_str) == Some("pagination"))
        .ok_or_else(|| ExtractError::missing(format!("{CONTENT_LIST}[type=pagination]")))?;

    let props = entry
        .get("props")
        .ok_or_else(|| ExtractError::missing("pagination.props"))?;

    let navigation: NavigationInfo = serde_json::from_value(props.clone())
        .map_err(|e| ExtractError::invalid("pagination.props", e))?;

    // A zero page size would pin the cursor in place forever
    if navigation.results_per_page == 0 {
        return Err(ExtractError::invalid(
            "pagination.props.resultsPerPage",
            "must be greater than zero",
        ));
    }

    Ok(navigation)
}

fn content_components(payload: &Value) -> ExtractResult<&Vec<Value>> {
    payload
        .get("searchPageProps")
        .and_then(|props| props.get("mainContentComponentsListProps"))
        .and_then(Value::as_array)
        .ok_or_else(|| ExtractError::missing(CONTENT_LIST))
}
