use stargauge::FetchProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: FetchProgress) {
        match event {
            FetchProgress::SearchStarted {
                min_stars,
                max_pages,
            } => {
                tracing::info!(min_stars, max_pages, "Fetching repositories");
            }

            FetchProgress::PageFetched {
                page,
                count,
                total_so_far,
                total_available,
            } => {
                tracing::info!(page, count, total_so_far, total_available, "Fetched page");
            }

            FetchProgress::RateLimitWait {
                page,
                wait_ms,
                attempt,
            } => {
                tracing::warn!(page, wait_ms, attempt, "Rate limited, waiting for reset");
            }

            FetchProgress::PageRetry {
                page,
                wait_ms,
                attempt,
            } => {
                tracing::warn!(page, wait_ms, attempt, "Transient failure, retrying page");
            }

            FetchProgress::SearchComplete { total } => {
                tracing::info!(total, "Fetch complete");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
