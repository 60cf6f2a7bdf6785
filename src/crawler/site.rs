//! Immutable site settings and request construction
//!
//! Everything that identifies the target site (endpoints, fixed feed
//! parameters, the review limit) is resolved once from configuration and
//! shared read-only between the orchestrator and every record chain.

use crate::config::SiteConfig;
use crate::crawler::gateway::FetchRequest;
use crate::types::SearchQuery;
use crate::ConfigError;
use url::Url;

/// Resolved endpoints and fixed parameters for one target site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSettings {
    base_url: Url,
    search_url: Url,
    redirect_prefix: String,
    review_params: Vec<(String, String)>,
    comments_limit: usize,
}

impl SiteSettings {
    /// Builds site settings from the `[site]` configuration section
    pub fn from_config(config: &SiteConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

        let search_url = base_url
            .join(&config.search_path)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search-path: {}", e)))?;

        Ok(Self {
            base_url,
            search_url,
            redirect_prefix: config.redirect_prefix.clone(),
            review_params: vec![
                ("rl".to_string(), config.review_language.clone()),
                ("order_by".to_string(), config.review_order.clone()),
            ],
            comments_limit: config.comments_limit,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn redirect_prefix(&self) -> &str {
        &self.redirect_prefix
    }

    pub fn comments_limit(&self) -> usize {
        self.comments_limit
    }

    /// Search page request for `query`
    pub fn search_request(&self, query: &SearchQuery) -> FetchRequest {
        FetchRequest::get(self.search_url.as_str()).with_params(query.to_params())
    }

    /// Review feed request for one business
    pub fn review_request(&self, business_id: &str) -> Result<FetchRequest, url::ParseError> {
        let url = self
            .base_url
            .join(&format!("/biz/{}/review_feed", business_id))?;
        Ok(FetchRequest::get(url.as_str()).with_params(self.review_params.clone()))
    }

    /// Resolves a listing path reported by the search feed into an absolute URL
    pub fn listing_url(&self, detail_path: &str) -> Result<String, url::ParseError> {
        Ok(self.base_url.join(detail_path)?.to_string())
    }
}
