//! Progress reporting types for the collection pipeline.
//!
//! Library code emits typed events through an optional callback; the CLI
//! decides how to render them (interactive bar or structured logging).

/// Progress events emitted while collecting search pages.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum FetchProgress {
    /// Starting a search sweep.
    SearchStarted {
        /// Minimum star count in the query filter.
        min_stars: u64,
        /// Upper bound on pages for this sweep.
        max_pages: u32,
    },

    /// Fetched a page of repositories.
    PageFetched {
        /// Page number (1-indexed).
        page: u32,
        /// Number of records on this page.
        count: usize,
        /// Running total of records fetched so far.
        total_so_far: usize,
        /// Total matching repositories reported by the endpoint.
        total_available: u64,
    },

    /// Rate limited; sleeping until the advertised reset instant.
    RateLimitWait {
        /// Page that hit the limit.
        page: u32,
        /// Time to wait before resuming (ms).
        wait_ms: u64,
        /// Attempt number for this page (1-indexed).
        attempt: u32,
    },

    /// Transient failure on a page fetch; retrying with backoff.
    PageRetry {
        /// Page being retried.
        page: u32,
        /// Time to wait before the retry (ms).
        wait_ms: u64,
        /// Attempt number for this page (1-indexed).
        attempt: u32,
    },

    /// Finished collecting all pages.
    SearchComplete {
        /// Total records collected.
        total: usize,
    },
}

/// Callback for progress updates during collection.
pub type ProgressCallback = Box<dyn Fn(FetchProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: FetchProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
