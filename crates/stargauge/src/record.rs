//! Record types for the two flat files the pipeline produces.
//!
//! `RepoRecord` is the wire representation written to the raw file by the
//! collector. `RawRow` is the lenient shape the transformer reads back, with
//! optional numeric fields so malformed rows can be excluded and counted
//! instead of aborting the run. `ProcessedRecord` is the canonical shape
//! consumed by the visualization layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker written for an absent primary language.
///
/// Held as `Option` in memory; the marker is applied only at the file
/// boundary, and the `language_known` column disambiguates it from a real
/// language of the same name.
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// One repository as fetched from the search endpoint, pre-normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRecord {
    /// Platform-assigned numeric ID, unique across the result set.
    pub id: u64,
    /// Full name in `owner/name` form.
    pub full_name: String,
    /// Owner login (user or organization).
    pub owner: String,
    /// Star count.
    pub stars: u64,
    /// Fork count.
    pub forks: u64,
    /// Primary programming language.
    pub language: Option<String>,
    /// Creation timestamp in wire form.
    pub created_at: String,
    /// Last-push timestamp in wire form.
    pub pushed_at: String,
    /// License SPDX identifier.
    pub license: Option<String>,
    /// Repository URL.
    pub url: String,
}

/// A row read back from the raw file for transformation.
///
/// Numeric fields are optional: a row missing its identifier or star count
/// fails shape validation and is excluded from the processed output.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub stars: Option<u64>,
    #[serde(default)]
    pub forks: Option<u64>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub pushed_at: String,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub url: String,
}

impl From<RepoRecord> for RawRow {
    fn from(record: RepoRecord) -> Self {
        Self {
            id: Some(record.id),
            full_name: record.full_name,
            owner: record.owner,
            stars: Some(record.stars),
            forks: Some(record.forks),
            language: record.language,
            created_at: record.created_at,
            pushed_at: record.pushed_at,
            license: record.license,
            url: record.url,
        }
    }
}

/// Popularity band over star count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PopularityBand {
    #[serde(rename = "Low Popularity")]
    Low,
    #[serde(rename = "Moderate Popularity")]
    Moderate,
    #[serde(rename = "High Popularity")]
    High,
}

impl PopularityBand {
    /// Band boundaries: up to 10 000 stars Low, up to 50 000 Moderate,
    /// everything above High.
    #[must_use]
    pub fn for_stars(stars: u64) -> Self {
        match stars {
            0..=10_000 => PopularityBand::Low,
            10_001..=50_000 => PopularityBand::Moderate,
            _ => PopularityBand::High,
        }
    }
}

/// One repository in canonical form, with derived columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub id: u64,
    pub full_name: String,
    pub owner: String,
    pub stars: u64,
    pub forks: u64,
    /// Rendered with the [`UNKNOWN_LANGUAGE`] marker when absent.
    #[serde(with = "language_marker")]
    pub language: Option<String>,
    /// True when a primary language was reported upstream.
    pub language_known: bool,
    pub created_at: DateTime<Utc>,
    pub pushed_at: DateTime<Utc>,
    pub license: Option<String>,
    pub url: String,
    pub repo_age_days: i64,
    pub repo_age_years: f64,
    pub days_since_last_push: i64,
    /// Pushed to within the last 180 days.
    pub is_active: bool,
    pub stars_per_year: f64,
    pub forks_per_year: f64,
    /// stars + 2 × forks.
    pub popularity_score: u64,
    pub engagement_rate: f64,
    pub star_to_fork_ratio: f64,
    pub category: PopularityBand,
    /// Min–max normalized popularity score over the batch, scaled to [0, 100].
    pub popularity_score_normalized: f64,
}

mod language_marker {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::UNKNOWN_LANGUAGE;

    pub fn serialize<S>(language: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match language {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_str(UNKNOWN_LANGUAGE),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        if value == UNKNOWN_LANGUAGE || value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(value))
        }
    }
}
