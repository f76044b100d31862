//! Search API wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::RepoRecord;

/// Hard upper bound the endpoint places on `per_page`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters for a repository search sweep.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Only repositories with strictly more stars than this match.
    pub min_stars: u64,
    /// Items per page, clamped to [`MAX_PAGE_SIZE`].
    pub page_size: u32,
}

impl SearchQuery {
    #[must_use]
    pub fn new(min_stars: u64, page_size: u32) -> Self {
        Self {
            min_stars,
            page_size: page_size.min(MAX_PAGE_SIZE),
        }
    }

    /// Render the query string for a given page.
    ///
    /// Results are sorted by star count descending so each run produces a
    /// stable leaderboard ordering.
    #[must_use]
    pub fn to_query_string(&self, page: u32) -> String {
        format!(
            "q=stars:>{}&sort=stars&order=desc&per_page={}&page={}",
            self.min_stars, self.page_size, page
        )
    }
}

/// Response envelope of the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Total repositories matching the query upstream.
    pub total_count: u64,
    /// Whether the search timed out upstream and returned partial matches.
    #[serde(default)]
    pub incomplete_results: bool,
    /// Matches for the requested page.
    pub items: Vec<SearchItem>,
}

/// One repository entry in a search response.
///
/// Only the fields the pipeline consumes are modeled; everything else in the
/// payload is ignored during deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchItem {
    pub id: u64,
    pub full_name: String,
    #[serde(default)]
    pub owner: Option<ItemOwner>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub pushed_at: Option<String>,
    #[serde(default)]
    pub license: Option<ItemLicense>,
    pub html_url: String,
}

/// Owner stanza of a search item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemOwner {
    pub login: String,
}

/// License stanza of a search item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemLicense {
    #[serde(default)]
    pub spdx_id: Option<String>,
}

/// Rate limit information read from response headers.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    /// Maximum requests allowed per window.
    pub limit: usize,
    /// Remaining requests in the current window.
    pub remaining: usize,
    /// When the window resets.
    pub reset_at: DateTime<Utc>,
    /// Server-directed wait in seconds, if present.
    pub retry_after: Option<u64>,
}

/// One decoded page of search results.
#[derive(Debug, Clone)]
pub struct SearchPage {
    /// Records on this page, in response order.
    pub records: Vec<RepoRecord>,
    /// Total matches reported upstream.
    pub total_count: u64,
    /// Whether the upstream search was truncated.
    pub incomplete_results: bool,
    /// Rate limit state after serving this page, if advertised.
    pub rate_limit: Option<RateLimitInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_is_deterministic_and_ordered() {
        let query = SearchQuery::new(27_500, 100);
        assert_eq!(
            query.to_query_string(3),
            "q=stars:>27500&sort=stars&order=desc&per_page=100&page=3"
        );
    }

    #[test]
    fn page_size_is_clamped_to_endpoint_maximum() {
        let query = SearchQuery::new(27_500, 500);
        assert_eq!(query.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn search_response_deserializes_minimal_item() {
        let json = r#"{
            "total_count": 1042,
            "incomplete_results": false,
            "items": [
                {
                    "id": 28457823,
                    "full_name": "freeCodeCamp/freeCodeCamp",
                    "owner": {"login": "freeCodeCamp"},
                    "stargazers_count": 400000,
                    "forks_count": 37000,
                    "language": "TypeScript",
                    "created_at": "2014-12-24T17:49:19Z",
                    "pushed_at": "2024-06-01T12:00:00Z",
                    "license": {"spdx_id": "BSD-3-Clause"},
                    "html_url": "https://github.com/freeCodeCamp/freeCodeCamp"
                }
            ]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.total_count, 1042);
        assert_eq!(response.items.len(), 1);

        let item = &response.items[0];
        assert_eq!(item.id, 28457823);
        assert_eq!(item.owner.as_ref().unwrap().login, "freeCodeCamp");
        assert_eq!(item.language.as_deref(), Some("TypeScript"));
        assert_eq!(
            item.license.as_ref().unwrap().spdx_id.as_deref(),
            Some("BSD-3-Clause")
        );
    }

    #[test]
    fn search_response_tolerates_null_language_and_license() {
        let json = r#"{
            "total_count": 1,
            "items": [
                {
                    "id": 7,
                    "full_name": "octo/mystery",
                    "owner": {"login": "octo"},
                    "stargazers_count": 30000,
                    "forks_count": 10,
                    "language": null,
                    "created_at": "2020-01-01T00:00:00Z",
                    "pushed_at": "2023-01-01T00:00:00Z",
                    "license": null,
                    "html_url": "https://github.com/octo/mystery"
                }
            ]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let item = &response.items[0];
        assert!(item.language.is_none());
        assert!(item.license.is_none());
        assert!(!response.incomplete_results);
    }

    #[test]
    fn search_response_ignores_unknown_fields() {
        let json = r#"{
            "total_count": 1,
            "incomplete_results": true,
            "items": [
                {
                    "id": 1,
                    "full_name": "a/b",
                    "owner": {"login": "a", "id": 99, "type": "User"},
                    "stargazers_count": 1,
                    "forks_count": 0,
                    "html_url": "https://github.com/a/b",
                    "score": 1.0,
                    "topics": ["x"]
                }
            ]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(response.incomplete_results);
        assert!(response.items[0].created_at.is_none());
    }
}
