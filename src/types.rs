//! Core data types shared by the extractors, the orchestrator and the sinks

use serde::{Deserialize, Serialize};

/// A single search request against the results feed
///
/// The category and location stay fixed for the whole run; only the cursor
/// moves, and it only moves forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Search category, sent as `find_desc`
    pub category: String,

    /// Search location, sent as `find_loc`
    pub location: String,

    /// Result offset, sent as `start`
    pub cursor: u64,
}

impl SearchQuery {
    /// Creates the seed query for a run (cursor 0)
    pub fn new(category: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            location: location.into(),
            cursor: 0,
        }
    }

    /// Returns a copy of this query positioned at `cursor`
    pub fn with_cursor(&self, cursor: u64) -> Self {
        Self {
            cursor,
            ..self.clone()
        }
    }

    /// Form parameters for the search endpoint
    pub fn to_params(&self) -> Vec<(String, String)> {
        vec![
            ("find_desc".to_string(), self.category.clone()),
            ("find_loc".to_string(), self.location.clone()),
            ("start".to_string(), self.cursor.to_string()),
        ]
    }
}

/// One organic entry from a search results page
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub business_id: String,
    pub is_advertisement: bool,
    pub name: String,
    pub rating: f64,
    pub review_count: u64,
    /// Listing path as reported by the server (usually relative, e.g. `/biz/some-shop`)
    pub detail_page_url: String,
}

/// Server-reported pagination counters for one search page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationInfo {
    pub start_result: u64,
    pub results_per_page: u64,
    pub total_results: u64,
}

/// A review sample attached to a business record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub reviewer_name: String,
    pub reviewer_location: String,
    pub review_date: String,
}

/// A completed business record, as handed to the output sinks
///
/// `business_website` serializes as `null` when no external link was found;
/// the field is never omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub business_name: String,
    pub business_rating: f64,
    pub number_of_reviews: u64,
    pub business_yelp_url: String,
    pub business_website: Option<String>,
    pub reviews: Vec<Review>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_query_starts_at_zero() {
        let query = SearchQuery::new("contractors", "San Francisco, CA");
        assert_eq!(query.cursor, 0);
        assert_eq!(
            query.to_params(),
            vec![
                ("find_desc".to_string(), "contractors".to_string()),
                ("find_loc".to_string(), "San Francisco, CA".to_string()),
                ("start".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_with_cursor_keeps_search_terms() {
        let seed = SearchQuery::new("plumbers", "Austin, TX");
        let next = seed.with_cursor(10);

        assert_eq!(next.category, "plumbers");
        assert_eq!(next.location, "Austin, TX");
        assert_eq!(next.cursor, 10);
        assert_eq!(seed.cursor, 0);
    }

    #[test]
    fn test_navigation_deserializes_camel_case() {
        let nav: NavigationInfo = serde_json::from_value(serde_json::json!({
            "startResult": 10,
            "resultsPerPage": 10,
            "totalResults": 25
        }))
        .unwrap();

        assert_eq!(nav.start_result, 10);
        assert_eq!(nav.results_per_page, 10);
        assert_eq!(nav.total_results, 25);
    }

    #[test]
    fn test_record_serializes_missing_website_as_null() {
        let record = BusinessRecord {
            business_name: "Shop".to_string(),
            business_rating: 4.5,
            number_of_reviews: 12,
            business_yelp_url: "https://www.yelp.com/biz/shop".to_string(),
            business_website: None,
            reviews: vec![],
        };

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("business_website").unwrap().is_null());
        assert_eq!(value["reviews"], serde_json::json!([]));
    }
}
