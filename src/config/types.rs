use serde::Deserialize;

/// Main configuration structure for Listing Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Search parameters, constant for the whole run
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// What to search for (e.g. "contractors")
    pub category: String,

    /// Where to search (e.g. "San Francisco, CA")
    pub location: String,
}

/// Target site endpoints and fixed request parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Scheme and host of the listing site
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Path of the search results endpoint
    #[serde(rename = "search-path", default = "default_search_path")]
    pub search_path: String,

    /// Path prefix of outbound website redirect links on listing pages
    #[serde(rename = "redirect-prefix", default = "default_redirect_prefix")]
    pub redirect_prefix: String,

    /// Review feed language (`rl`)
    #[serde(rename = "review-language", default = "default_review_language")]
    pub review_language: String,

    /// Review feed ordering (`order_by`)
    #[serde(rename = "review-order", default = "default_review_order")]
    pub review_order: String,

    /// Maximum number of reviews kept per business
    #[serde(rename = "comments-limit", default = "default_comments_limit")]
    pub comments_limit: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_path: default_search_path(),
            redirect_prefix: default_redirect_prefix(),
            review_language: default_review_language(),
            review_order: default_review_order(),
            comments_limit: default_comments_limit(),
        }
    }
}

/// Request pacing and retry behaviour of the HTTP gateway
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of requests in flight at once
    #[serde(rename = "max-concurrent-requests", default = "default_max_concurrent")]
    pub max_concurrent_requests: u32,

    /// Minimum time between the start of two requests (milliseconds)
    #[serde(rename = "minimum-request-interval", default = "default_request_interval")]
    pub minimum_request_interval: u64,

    /// Retries for timeouts and 5xx responses
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before each retry (milliseconds)
    #[serde(rename = "retry-delay", default = "default_retry_delay")]
    pub retry_delay: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Stop after this many search pages (0 = follow pagination to the end)
    #[serde(rename = "max-pages", default)]
    pub max_pages: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent(),
            minimum_request_interval: default_request_interval(),
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            request_timeout: default_request_timeout(),
            max_pages: 0,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON Lines record file
    #[serde(rename = "jsonl-path")]
    pub jsonl_path: Option<String>,

    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: Option<String>,
}

fn default_base_url() -> String {
    "https://www.yelp.com".to_string()
}

fn default_search_path() -> String {
    "/query/fragment".to_string()
}

fn default_redirect_prefix() -> String {
    "/biz_redir".to_string()
}

fn default_review_language() -> String {
    "en".to_string()
}

fn default_review_order() -> String {
    "relevance_desc".to_string()
}

fn default_comments_limit() -> usize {
    5
}

fn default_max_concurrent() -> u32 {
    8
}

fn default_request_interval() -> u64 {
    250
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    2000
}

fn default_request_timeout() -> u64 {
    30
}
