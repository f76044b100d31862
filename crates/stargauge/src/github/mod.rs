//! GitHub repository-search API integration.

pub mod client;
pub mod convert;
pub mod error;
pub mod types;

pub use client::{RequestPacer, SearchClient, parse_rate_limit_headers};
pub use convert::to_repo_record;
pub use error::SearchError;
pub use types::{RateLimitInfo, SearchItem, SearchPage, SearchQuery, SearchResponse};
