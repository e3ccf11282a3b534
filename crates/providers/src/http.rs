//! Rate-limited JSON HTTP client shared by every adapter.
//!
//! Each adapter owns one client so each upstream gets its own governor quota.

use governor::{Quota, RateLimiter};
use market_pulse_core::{UpstreamError, UpstreamResult};
use nonzero_ext::nonzero;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for the API, without trailing slash.
    pub base_url: String,

    /// Requests per minute limit.
    pub requests_per_minute: NonZeroU32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            requests_per_minute: nonzero!(60u32),
            timeout_secs: 10,
        }
    }
}

impl HttpClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url)
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the rate limit. Zero is raised to one.
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_minute: u32) -> Self {
        self.requests_per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(nonzero!(1u32));
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

// =============================================================================
// Client
// =============================================================================

pub struct RateLimitedClient {
    config: HttpClientConfig,
    http: Client,
    rate_limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
}

impl std::fmt::Debug for RateLimitedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedClient")
            .field("base_url", &self.config.base_url)
            .field("requests_per_minute", &self.config.requests_per_minute)
            .finish_non_exhaustive()
    }
}

impl RateLimitedClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: HttpClientConfig) -> UpstreamResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Mozilla/5.0 (compatible; market-pulse/0.1)")
            .build()
            .map_err(|e| UpstreamError::Network(format!("failed to build HTTP client: {e}")))?;

        let quota = Quota::per_minute(config.requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            config,
            http,
            rate_limiter,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Builds `{base_url}/{segments...}`, percent-encoding each segment.
    ///
    /// # Errors
    /// Returns a parse error if the base URL is not a valid absolute URL.
    pub fn endpoint(&self, segments: &[&str]) -> UpstreamResult<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| UpstreamError::Parse(format!("invalid base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| UpstreamError::Parse("base url cannot have path segments".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Waits for the rate limiter and makes a GET request.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> UpstreamResult<T> {
        self.rate_limiter.until_ready().await;

        tracing::debug!("GET {}", url.path());

        let response = self
            .http
            .get(url)
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(upstream_from_reqwest)?;

        Self::handle_response(response).await
    }

    /// Waits for the rate limiter and makes a POST request with a JSON body.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: Url,
        query: &[(&str, String)],
        body: &B,
    ) -> UpstreamResult<T> {
        self.rate_limiter.until_ready().await;

        tracing::debug!("POST {}", url.path());

        let response = self
            .http
            .post(url)
            .query(query)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(upstream_from_reqwest)?;

        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> UpstreamResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(UpstreamError::api(status.as_u16(), truncate(&text, 200)));
        }

        let bytes = response.bytes().await.map_err(upstream_from_reqwest)?;
        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Parse(e.to_string()))
    }
}

/// Maps a transport error onto the collaborator error taxonomy.
#[must_use]
pub fn upstream_from_reqwest(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout(err.to_string())
    } else if err.is_connect() {
        UpstreamError::Network(format!("connection failed: {err}"))
    } else if err.is_decode() {
        UpstreamError::Parse(err.to_string())
    } else {
        UpstreamError::Network(err.to_string())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
