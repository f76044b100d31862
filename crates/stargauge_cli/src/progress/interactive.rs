use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use stargauge::FetchProgress;

/// Interactive progress reporter using indicatif.
///
/// One bar tracks pages for the sweep; rate-limit waits and retries are
/// printed above it so they stay visible after the bar completes.
pub struct InteractiveReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} pages {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    pub fn handle(&self, event: FetchProgress) {
        let mut state = self.bar.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            FetchProgress::SearchStarted {
                min_stars,
                max_pages,
            } => {
                let bar = ProgressBar::new(max_pages as u64);
                bar.set_style(Self::bar_style());
                bar.set_message(format!("stars > {min_stars}"));
                *state = Some(bar);
            }

            FetchProgress::PageFetched {
                page,
                total_so_far,
                ..
            } => {
                if let Some(bar) = state.as_ref() {
                    bar.set_position(page as u64);
                    bar.set_message(format!("{total_so_far} repositories"));
                }
            }

            FetchProgress::RateLimitWait { page, wait_ms, .. } => {
                if let Some(bar) = state.as_ref() {
                    bar.println(format!(
                        "Rate limited on page {page}; waiting {:.0}s for reset",
                        wait_ms as f64 / 1000.0
                    ));
                }
            }

            FetchProgress::PageRetry { page, attempt, .. } => {
                if let Some(bar) = state.as_ref() {
                    bar.println(format!("Retrying page {page} (attempt {attempt})"));
                }
            }

            FetchProgress::SearchComplete { total } => {
                if let Some(bar) = state.take() {
                    bar.finish_with_message(format!("{total} repositories fetched"));
                }
            }

            _ => {}
        }
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
