//! Review feed extraction

use crate::extract::{ExtractError, ExtractResult};
use crate::types::Review;
use serde_json::Value;

/// Takes the first `limit` reviews from a review feed, in server order
///
/// Only the entries that are kept are inspected. Each kept entry must carry
/// `user.markupDisplayName` and `localizedDate`; `user.displayLocation` is
/// optional on the feed and defaults to an empty string.
pub fn extract_reviews(payload: &Value, limit: usize) -> ExtractResult<Vec<Review>> {
    let reviews = payload
        .get("reviews")
        .ok_or_else(|| ExtractError::missing("reviews"))?
        .as_array()
        .ok_or_else(|| ExtractError::invalid("reviews", "is not a list"))?;

    reviews
        .iter()
        .take(limit)
        .enumerate()
        .map(|(index, entry)| extract_review(entry, index))
        .collect()
}

fn extract_review(entry: &Value, index: usize) -> ExtractResult<Review> {
    let user = entry
        .get("user")
        .ok_or_else(|| ExtractError::missing(format!("reviews[{index}].user")))?;

    let reviewer_name = string_field(user, "markupDisplayName")
        .ok_or_else(|| ExtractError::missing(format!("reviews[{index}].user.markupDisplayName")))?;

    let review_date = string_field(entry, "localizedDate")
        .ok_or_else(|| ExtractError::missing(format!("reviews[{index}].localizedDate")))?;

    let reviewer_location = string_field(user, "displayLocation").unwrap_or_default();

    Ok(Review {
        reviewer_name,
        reviewer_location,
        review_date,
    })
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
