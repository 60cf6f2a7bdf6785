//! Fetch gateway
//!
//! The orchestrator never talks to the network directly; it goes through the
//! `FetchGateway` trait. `HttpGateway` is the production implementation and
//! owns everything transport-related:
//! - Building the HTTP client with a proper user agent string
//! - A global cap on requests in flight
//! - Minimum spacing between request starts
//! - Retries for transient failures
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;

/// A GET request with form parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    /// Looks up a parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Transport-level failures surfaced by a gateway
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Failed to read body from {url}: {message}")]
    Body { url: String, message: String },
}

impl TransportError {
    /// Returns true for failures worth another attempt (timeouts and 5xx)
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Network { .. } | Self::Body { .. } => false,
        }
    }
}

/// Executes GET requests on behalf of the crawl core
///
/// Implementations own retries, throttling and timeouts; callers treat any
/// `Err` as final.
#[async_trait]
pub trait FetchGateway: Send + Sync {
    /// Fetches `request` and returns the decoded response body
    async fn fetch(&self, request: &FetchRequest) -> Result<String, TransportError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use listing_harvest::config::UserAgentConfig;
/// use listing_harvest::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "ListingHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Pacing and retry knobs for `HttpGateway`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewaySettings {
    pub max_concurrent_requests: usize,
    pub minimum_interval: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
}

impl From<&CrawlerConfig> for GatewaySettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_concurrent_requests: config.max_concurrent_requests as usize,
            minimum_interval: Duration::from_millis(config.minimum_request_interval),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay),
            request_timeout: Duration::from_secs(config.request_timeout),
        }
    }
}

/// reqwest-backed gateway with concurrency cap, pacing and retries
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Return body |
/// | HTTP 5xx | Retry up to `max_retries` times, `retry_delay` apart |
/// | Timeout | Retry up to `max_retries` times, `retry_delay` apart |
/// | Other HTTP status (404, 429, ...) | Fail immediately |
/// | Connection refused / TLS error | Fail immediately |
pub struct HttpGateway {
    client: Client,
    permits: Arc<Semaphore>,
    next_slot: Mutex<Option<Instant>>,
    settings: GatewaySettings,
}

impl HttpGateway {
    pub fn new(client: Client, settings: GatewaySettings) -> Self {
        Self {
            client,
            permits: Arc::new(Semaphore::new(settings.max_concurrent_requests.max(1))),
            next_slot: Mutex::new(None),
            settings,
        }
    }

    /// Builds a gateway from the `[crawler]` and `[user-agent]` sections
    pub fn from_config(
        crawler: &CrawlerConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        let settings = GatewaySettings::from(crawler);
        let client = build_http_client(user_agent, settings.request_timeout)?;
        Ok(Self::new(client, settings))
    }

    /// Waits until this request may start, keeping request starts
    /// `minimum_interval` apart across all callers
    async fn pace(&self) {
        if self.settings.minimum_interval.is_zero() {
            return;
        }

        let mut next_slot = self.next_slot.lock().await;
        if let Some(slot) = *next_slot {
            tokio::time::sleep_until(slot).await;
        }
        *next_slot = Some(Instant::now() + self.settings.minimum_interval);
    }

    async fn send_once(&self, request: &FetchRequest) -> Result<String, TransportError> {
        let url = request.url.clone();

        let response = self
            .client
            .get(&request.url)
            .query(&request.params)
            .send()
            .await
            .map_err(|e| classify_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::TOO_MANY_REQUESTS {
                tracing::warn!("Rate limited by server at {}", url);
            }
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| TransportError::Body {
            url,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl FetchGateway for HttpGateway {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, TransportError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| TransportError::Network {
                url: request.url.clone(),
                message: "gateway is shut down".to_string(),
            })?;

        let mut attempt = 0;
        loop {
            self.pace().await;
            tracing::trace!("GET {} {:?}", request.url, request.params);

            match self.send_once(request).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.settings.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "{} (attempt {}/{}), retrying in {:?}",
                        e,
                        attempt,
                        self.settings.max_retries,
                        self.settings.retry_delay
                    );
                    tokio::time::sleep(self.settings.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        TransportError::Network {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        TransportError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
