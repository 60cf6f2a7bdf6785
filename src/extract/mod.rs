//! Payload extractors
//!
//! Pure functions that turn one fetched payload into structured data:
//! - Search pages → organic hits and pagination counters
//! - Review feeds → a bounded, ordered review sample
//! - Listing pages → the external website link, if any
//!
//! JSON payloads are navigated explicitly; a missing structural field is a
//! `MalformedPayload` error rather than a silent default.

mod reviews;
mod search;
mod website;

pub use reviews::extract_reviews;
pub use search::{extract_navigation, extract_search_hits, parse_search_page, SearchPage};
pub use website::extract_website;

use serde_json::Value;
use thiserror::Error;

/// Errors raised while extracting data from a payload
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Malformed payload: {field} {reason}")]
    MalformedPayload { field: String, reason: String },
}

impl ExtractError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MalformedPayload {
            field: field.into(),
            reason: "is missing".to_string(),
        }
    }

    pub(crate) fn invalid(field: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedPayload {
            field: field.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Decodes a response body into a JSON document
pub fn parse_json(body: &str) -> ExtractResult<Value> {
    Ok(serde_json::from_str(body)?)
}
