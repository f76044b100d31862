//! Serial page collection against the search endpoint.
//!
//! Pagination is strictly serial to respect the endpoint's rate budget; the
//! only suspension points are the optional proactive pacer and the
//! rate-limit backoff sleep.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::Retryable;
use chrono::{DateTime, Utc};

use crate::github::{SearchClient, SearchError, SearchPage, SearchQuery};
use crate::progress::{FetchProgress, ProgressCallback, emit};
use crate::record::RepoRecord;
use crate::retry::RetryConfig;

/// Default star threshold for inclusion.
pub const DEFAULT_MIN_STARS: u64 = 27_500;

/// Default items per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default page cap per sweep.
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// Options for a collection sweep.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Only repositories with strictly more stars than this are fetched.
    pub min_stars: u64,
    /// Items per page (endpoint caps this at 100).
    pub page_size: u32,
    /// Maximum pages to fetch in one sweep.
    pub max_pages: u32,
    /// Retry policy for transient failures and rate limits.
    pub retry: RetryConfig,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            min_stars: DEFAULT_MIN_STARS,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            retry: RetryConfig::default(),
        }
    }
}

/// Collect all pages for a sweep, in response order.
///
/// Stops when a page comes back short, the page cap is reached, or the
/// accumulated count reaches the total the endpoint reports. Nothing is
/// written here; persisting the result is the caller's one-shot, atomic
/// write.
pub async fn collect(
    client: &SearchClient,
    options: &CollectOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<Vec<RepoRecord>, SearchError> {
    let query = SearchQuery::new(options.min_stars, options.page_size);

    emit(
        on_progress,
        FetchProgress::SearchStarted {
            min_stars: options.min_stars,
            max_pages: options.max_pages,
        },
    );

    let mut records: Vec<RepoRecord> = Vec::new();
    let mut page = 1u32;

    while page <= options.max_pages {
        let fetched = fetch_page_with_recovery(client, &query, page, &options.retry, on_progress)
            .await?;

        let count = fetched.records.len();
        records.extend(fetched.records);

        emit(
            on_progress,
            FetchProgress::PageFetched {
                page,
                count,
                total_so_far: records.len(),
                total_available: fetched.total_count,
            },
        );
        tracing::debug!(page, count, total_so_far = records.len(), "fetched page");

        // A short page is the last page.
        if count < query.page_size as usize {
            break;
        }
        if records.len() as u64 >= fetched.total_count {
            break;
        }

        page += 1;
    }

    emit(
        on_progress,
        FetchProgress::SearchComplete {
            total: records.len(),
        },
    );
    tracing::info!(total = records.len(), "search sweep complete");

    Ok(records)
}

/// Fetch one page, absorbing transient failures and rate limits per policy.
///
/// Transient transport errors go through exponential backoff. A rate-limit
/// response waits until the advertised reset instant (capped) and retries
/// the same page; when the wait budget is spent, the error propagates.
async fn fetch_page_with_recovery(
    client: &SearchClient,
    query: &SearchQuery,
    page: u32,
    retry: &RetryConfig,
    on_progress: Option<&ProgressCallback>,
) -> Result<SearchPage, SearchError> {
    let mut rate_limit_waits = 0u32;

    loop {
        let attempt = AtomicU32::new(0);
        let operation = || {
            attempt.fetch_add(1, Ordering::SeqCst);
            client.fetch_page(query, page)
        };

        let result = operation
            .retry(retry.clone().into_backoff())
            .when(SearchError::is_transient)
            .notify(|err, dur| {
                let current_attempt = attempt.load(Ordering::SeqCst);
                emit(
                    on_progress,
                    FetchProgress::PageRetry {
                        page,
                        wait_ms: dur.as_millis() as u64,
                        attempt: current_attempt,
                    },
                );
                tracing::debug!(
                    page,
                    attempt = current_attempt,
                    wait_ms = dur.as_millis() as u64,
                    error = %err,
                    "transient failure, retrying page"
                );
            })
            .await;

        match result {
            Ok(fetched) => return Ok(fetched),
            Err(SearchError::RateLimited { reset_at })
                if rate_limit_waits < retry.rate_limit_retries =>
            {
                rate_limit_waits += 1;
                let wait = wait_until(reset_at, retry.max_rate_limit_wait);

                emit(
                    on_progress,
                    FetchProgress::RateLimitWait {
                        page,
                        wait_ms: wait.as_millis() as u64,
                        attempt: rate_limit_waits,
                    },
                );
                tracing::warn!(
                    page,
                    wait_ms = wait.as_millis() as u64,
                    %reset_at,
                    "rate limited, waiting for reset"
                );

                tokio::time::sleep(wait).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Duration until `reset_at`, capped; zero when the reset is already past.
fn wait_until(reset_at: DateTime<Utc>, cap: Duration) -> Duration {
    (reset_at - Utc::now())
        .to_std()
        .unwrap_or(Duration::ZERO)
        .min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::http::{HttpResponse, MockTransport};

    const BASE: &str = "https://api.example.test";

    fn test_client(transport: &MockTransport) -> SearchClient {
        SearchClient::with_transport("test-token", Arc::new(transport.clone()))
            .with_base_url(BASE)
            .with_pacer(None)
    }

    fn fast_retry() -> RetryConfig {
        let mut retry = RetryConfig::default().with_jitter(false);
        retry.min_delay = Duration::from_millis(1);
        retry.max_delay = Duration::from_millis(10);
        retry
    }

    fn page_body(total: u64, ids: &[u64]) -> Vec<u8> {
        let items: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| {
                serde_json::json!({
                    "id": id,
                    "full_name": format!("owner/repo{id}"),
                    "owner": {"login": "owner"},
                    "stargazers_count": 30_000 + id,
                    "forks_count": 10,
                    "language": "Rust",
                    "created_at": "2020-01-01T00:00:00Z",
                    "pushed_at": "2024-01-01T00:00:00Z",
                    "license": {"spdx_id": "MIT"},
                    "html_url": format!("https://github.com/owner/repo{id}")
                })
            })
            .collect();

        serde_json::to_vec(&serde_json::json!({
            "total_count": total,
            "incomplete_results": false,
            "items": items,
        }))
        .expect("serialize page body")
    }

    fn ok_response(total: u64, ids: &[u64]) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: vec![
                ("x-ratelimit-limit".to_string(), "30".to_string()),
                ("x-ratelimit-remaining".to_string(), "29".to_string()),
                ("x-ratelimit-reset".to_string(), "1700000000".to_string()),
            ],
            body: page_body(total, ids),
        }
    }

    fn rate_limited_response(reset_at: DateTime<Utc>) -> HttpResponse {
        HttpResponse {
            status: 403,
            headers: vec![
                ("x-ratelimit-limit".to_string(), "30".to_string()),
                ("x-ratelimit-remaining".to_string(), "0".to_string()),
                (
                    "x-ratelimit-reset".to_string(),
                    reset_at.timestamp().to_string(),
                ),
            ],
            body: Vec::new(),
        }
    }

    fn capture_events() -> (ProgressCallback, Arc<Mutex<Vec<FetchProgress>>>) {
        let events: Arc<Mutex<Vec<FetchProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let events_capture = Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| {
            events_capture
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event);
        });
        (callback, events)
    }

    fn collected_ids(records: &[RepoRecord]) -> Vec<u64> {
        records.iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn collects_pages_until_short_page() {
        let transport = MockTransport::new();
        let client = test_client(&transport);
        let options = CollectOptions {
            page_size: 2,
            retry: fast_retry(),
            ..CollectOptions::default()
        };
        let query = SearchQuery::new(options.min_stars, options.page_size);

        transport.push_response(client.page_url(&query, 1), ok_response(5, &[1, 2]));
        transport.push_response(client.page_url(&query, 2), ok_response(5, &[3, 4]));
        transport.push_response(client.page_url(&query, 3), ok_response(5, &[5]));

        let records = collect(&client, &options, None).await.expect("collect");
        assert_eq!(collected_ids(&records), vec![1, 2, 3, 4, 5]);
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn stops_at_max_pages_even_when_more_match() {
        let transport = MockTransport::new();
        let client = test_client(&transport);
        let options = CollectOptions {
            page_size: 100,
            max_pages: 1,
            retry: fast_retry(),
            ..CollectOptions::default()
        };
        let query = SearchQuery::new(options.min_stars, options.page_size);

        let ids: Vec<u64> = (1..=100).collect();
        transport.push_response(client.page_url(&query, 1), ok_response(50_000, &ids));

        let records = collect(&client, &options, None).await.expect("collect");
        assert_eq!(records.len(), 100);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn stops_when_reported_total_is_reached() {
        let transport = MockTransport::new();
        let client = test_client(&transport);
        let options = CollectOptions {
            page_size: 2,
            retry: fast_retry(),
            ..CollectOptions::default()
        };
        let query = SearchQuery::new(options.min_stars, options.page_size);

        // Both pages are full; the reported total says there is no page 3.
        transport.push_response(client.page_url(&query, 1), ok_response(4, &[1, 2]));
        transport.push_response(client.page_url(&query, 2), ok_response(4, &[3, 4]));

        let records = collect(&client, &options, None).await.expect("collect");
        assert_eq!(collected_ids(&records), vec![1, 2, 3, 4]);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn empty_first_page_yields_no_records() {
        let transport = MockTransport::new();
        let client = test_client(&transport);
        let options = CollectOptions {
            retry: fast_retry(),
            ..CollectOptions::default()
        };
        let query = SearchQuery::new(options.min_stars, options.page_size);

        transport.push_response(client.page_url(&query, 1), ok_response(0, &[]));

        let records = collect(&client, &options, None).await.expect("collect");
        assert!(records.is_empty());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_on_middle_page_waits_once_and_resumes() {
        let transport = MockTransport::new();
        let client = test_client(&transport);
        let options = CollectOptions {
            page_size: 1,
            retry: fast_retry(),
            ..CollectOptions::default()
        };
        let query = SearchQuery::new(options.min_stars, options.page_size);

        let reset_at = Utc::now() + chrono::Duration::seconds(2);
        transport.push_response(client.page_url(&query, 1), ok_response(3, &[1]));
        transport.push_response(client.page_url(&query, 2), rate_limited_response(reset_at));
        transport.push_response(client.page_url(&query, 2), ok_response(3, &[2]));
        transport.push_response(client.page_url(&query, 3), ok_response(3, &[3]));

        let (callback, events) = capture_events();
        let records = collect(&client, &options, Some(&callback))
            .await
            .expect("collect");

        // All three pages, in the original order.
        assert_eq!(collected_ids(&records), vec![1, 2, 3]);

        let events = events.lock().unwrap_or_else(|e| e.into_inner());
        let waits: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, FetchProgress::RateLimitWait { .. }))
            .collect();
        assert_eq!(waits.len(), 1, "exactly one backoff wait expected");

        // The wait derives from the advertised reset time.
        if let FetchProgress::RateLimitWait { page, wait_ms, attempt } = waits[0] {
            assert_eq!(*page, 2);
            assert_eq!(*attempt, 1);
            assert!(*wait_ms > 0 && *wait_ms <= 2_000);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_rate_limit_is_fatal_after_budget() {
        let transport = MockTransport::new();
        let client = test_client(&transport);
        let options = CollectOptions {
            retry: fast_retry(),
            ..CollectOptions::default()
        };
        let query = SearchQuery::new(options.min_stars, options.page_size);

        let reset_at = Utc::now() + chrono::Duration::seconds(1);
        transport.push_response(client.page_url(&query, 1), rate_limited_response(reset_at));
        transport.push_response(client.page_url(&query, 1), rate_limited_response(reset_at));

        let err = collect(&client, &options, None)
            .await
            .expect_err("rate limit should become fatal");
        assert!(matches!(err, SearchError::RateLimited { .. }));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_is_retried_once_then_fatal() {
        let transport = MockTransport::new();
        let client = test_client(&transport);
        let options = CollectOptions {
            retry: fast_retry(),
            ..CollectOptions::default()
        };

        // No responses registered: every attempt is a transport error.
        let (callback, events) = capture_events();
        let err = collect(&client, &options, Some(&callback))
            .await
            .expect_err("transport failure should be fatal after retry");
        assert!(matches!(err, SearchError::Transport(_)));

        // Initial attempt plus the single configured retry.
        assert_eq!(transport.requests().len(), 2);

        let events = events.lock().unwrap_or_else(|e| e.into_inner());
        assert!(
            events
                .iter()
                .any(|e| matches!(e, FetchProgress::PageRetry { page: 1, .. }))
        );
    }

    #[tokio::test]
    async fn auth_failure_is_immediately_fatal() {
        let transport = MockTransport::new();
        let client = test_client(&transport);
        let options = CollectOptions {
            retry: fast_retry(),
            ..CollectOptions::default()
        };
        let query = SearchQuery::new(options.min_stars, options.page_size);

        transport.push_response(
            client.page_url(&query, 1),
            HttpResponse {
                status: 401,
                headers: Vec::new(),
                body: Vec::new(),
            },
        );

        let err = collect(&client, &options, None)
            .await
            .expect_err("auth failure");
        assert!(matches!(err, SearchError::AuthRequired));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn wait_until_caps_and_floors() {
        let cap = Duration::from_secs(900);

        let past = Utc::now() - chrono::Duration::seconds(10);
        assert_eq!(wait_until(past, cap), Duration::ZERO);

        let far = Utc::now() + chrono::Duration::hours(2);
        assert_eq!(wait_until(far, cap), cap);
    }
}
