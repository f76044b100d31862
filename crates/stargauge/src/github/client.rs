//! Search API client and rate limit management.

use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use crate::http::{HttpHeaders, HttpRequest, HttpTransport, ReqwestTransport, header_get};

use super::convert::to_repo_record;
use super::error::SearchError;
use super::types::{RateLimitInfo, SearchPage, SearchQuery, SearchResponse};

/// Default endpoint base.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// The search API allows 30 requests/minute; 1/sec keeps well inside that
/// while the pagination loop is serial anyway.
pub const SEARCH_DEFAULT_RPS: u32 = 1;

type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// A proactive request pacer using the governor crate.
///
/// Waits before each request so the client stays under the endpoint's
/// request-per-window budget instead of bouncing off it.
#[derive(Clone)]
pub struct RequestPacer {
    inner: Arc<GovernorRateLimiter>,
}

impl RequestPacer {
    /// Create a pacer allowing `requests_per_second` requests (minimum 1).
    #[must_use]
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::new(1).unwrap());
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));

        Self {
            inner: Arc::new(rate_limiter),
        }
    }

    /// Wait until a request is allowed.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

/// Extract rate limit info from response headers.
///
/// Returns `None` unless the standard limit/remaining/reset triple is
/// present; `Retry-After` is carried along when the server sends one.
#[must_use]
pub fn parse_rate_limit_headers(headers: &HttpHeaders) -> Option<RateLimitInfo> {
    let limit = header_get(headers, "x-ratelimit-limit")?.parse::<usize>().ok()?;
    let remaining = header_get(headers, "x-ratelimit-remaining")?
        .parse::<usize>()
        .ok()?;
    let reset_epoch = header_get(headers, "x-ratelimit-reset")?.parse::<i64>().ok()?;
    let reset_at = DateTime::from_timestamp(reset_epoch, 0).unwrap_or_else(Utc::now);
    let retry_after = header_get(headers, "retry-after").and_then(|v| v.parse::<u64>().ok());

    Some(RateLimitInfo {
        limit,
        remaining,
        reset_at,
        retry_after,
    })
}

/// When to resume after a limited response, if the headers say so.
///
/// `Retry-After` wins over the window reset; a non-zero remaining quota
/// means the 403 was not a rate limit at all.
fn rate_limit_reset(rate: Option<&RateLimitInfo>) -> Option<DateTime<Utc>> {
    let rate = rate?;
    if let Some(secs) = rate.retry_after {
        return Some(Utc::now() + chrono::Duration::seconds(secs as i64));
    }
    if rate.remaining == 0 {
        return Some(rate.reset_at);
    }
    None
}

/// Client for the repository search endpoint.
///
/// Holds the bearer token as an explicit value passed at construction; there
/// is no process-wide credential state.
#[derive(Clone)]
pub struct SearchClient {
    transport: Arc<dyn HttpTransport>,
    token: Arc<String>,
    base_url: String,
    pacer: Option<RequestPacer>,
}

impl SearchClient {
    /// Create a client with the default reqwest transport and pacing.
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self::with_transport(token, Arc::new(ReqwestTransport::default()))
    }

    /// Create a client over an arbitrary transport (mockable in tests).
    #[must_use]
    pub fn with_transport(token: &str, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            token: Arc::new(token.to_string()),
            base_url: DEFAULT_BASE_URL.to_string(),
            pacer: Some(RequestPacer::new(SEARCH_DEFAULT_RPS)),
        }
    }

    /// Override the endpoint base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replace the proactive pacer; `None` disables pacing.
    #[must_use]
    pub fn with_pacer(mut self, pacer: Option<RequestPacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// The full URL for one page of a query.
    #[must_use]
    pub fn page_url(&self, query: &SearchQuery, page: u32) -> String {
        format!(
            "{}/search/repositories?{}",
            self.base_url,
            query.to_query_string(page)
        )
    }

    /// Fetch and decode a single page of search results.
    pub async fn fetch_page(
        &self,
        query: &SearchQuery,
        page: u32,
    ) -> Result<SearchPage, SearchError> {
        if let Some(pacer) = &self.pacer {
            pacer.wait().await;
        }

        let url = self.page_url(query, page);
        let request = HttpRequest {
            url,
            headers: vec![
                (
                    "Accept".to_string(),
                    "application/vnd.github+json".to_string(),
                ),
                ("User-Agent".to_string(), "stargauge".to_string()),
                (
                    "Authorization".to_string(),
                    format!("Bearer {}", self.token.as_str()),
                ),
            ],
        };

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let rate_limit = parse_rate_limit_headers(&response.headers);

        match response.status {
            200 => {
                let decoded: SearchResponse = serde_json::from_slice(&response.body)
                    .map_err(|e| SearchError::Decode(e.to_string()))?;

                Ok(SearchPage {
                    records: decoded.items.iter().map(to_repo_record).collect(),
                    total_count: decoded.total_count,
                    incomplete_results: decoded.incomplete_results,
                    rate_limit,
                })
            }
            401 => Err(SearchError::AuthRequired),
            403 | 429 => match rate_limit_reset(rate_limit.as_ref()) {
                Some(reset_at) => Err(SearchError::RateLimited { reset_at }),
                None => Err(SearchError::AuthRequired),
            },
            status => Err(SearchError::Api {
                status,
                message: String::from_utf8_lossy(&response.body)
                    .chars()
                    .take(200)
                    .collect(),
            }),
        }
    }
}
