//! Stargauge - a star-threshold repository metadata pipeline.
//!
//! Two components run in sequence with a file-based handoff:
//!
//! - The collector issues paginated queries against the GitHub repository
//!   search endpoint, filtered by a minimum star count, and writes the
//!   result to a raw CSV file.
//! - The transformer reads the raw file back, coerces field types, derives
//!   popularity metrics, and writes a processed CSV file consumed by an
//!   external visualization tool.
//!
//! # Example
//!
//! ```ignore
//! use stargauge::{CollectOptions, SearchClient, TransformOptions, collect, transform};
//!
//! let client = SearchClient::new(&token);
//! let records = collect(&client, &CollectOptions::default(), None).await?;
//! stargauge::store::write_raw(&raw_path, &records)?;
//!
//! let raw = stargauge::store::read_raw(&raw_path)?;
//! let outcome = transform(&raw.rows, &TransformOptions::new(27_500, chrono::Utc::now()));
//! stargauge::store::write_processed(&processed_path, &outcome.records)?;
//! ```

pub mod collector;
pub mod github;
pub mod http;
pub mod progress;
pub mod record;
pub mod retry;
pub mod store;
pub mod transform;

pub use collector::{CollectOptions, collect};
pub use github::{RequestPacer, SearchClient, SearchError, SearchQuery};
pub use progress::{FetchProgress, ProgressCallback, emit};
pub use record::{PopularityBand, ProcessedRecord, RawRow, RepoRecord, UNKNOWN_LANGUAGE};
pub use retry::RetryConfig;
pub use store::{RawReadOutcome, StoreError};
pub use transform::{TransformOptions, TransformOutcome, TransformSummary, transform};
