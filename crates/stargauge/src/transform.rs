//! Normalization and derived metrics for raw repository rows.
//!
//! The transform is a pure function of its input: the reference timestamp
//! for age-derived columns is an explicit option, so the same raw rows with
//! the same options always produce the same processed sequence.

use chrono::{DateTime, Utc};

use crate::record::{PopularityBand, ProcessedRecord, RawRow};

/// Number of days without a push after which a repository counts as stale.
pub const ACTIVE_WITHIN_DAYS: i64 = 180;

/// Options for one transform run.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Rows below this star count are excluded.
    pub min_stars: u64,
    /// Reference instant for age-derived columns.
    pub as_of: DateTime<Utc>,
}

impl TransformOptions {
    #[must_use]
    pub fn new(min_stars: u64, as_of: DateTime<Utc>) -> Self {
        Self { min_stars, as_of }
    }
}

/// Per-reason exclusion counts for one transform run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformSummary {
    /// Rows seen on input.
    pub input: usize,
    /// Rows that made it to the processed output.
    pub written: usize,
    /// Rows excluded for a missing identifier or star count.
    pub missing_fields: usize,
    /// Rows excluded for an uncoercible timestamp.
    pub bad_timestamp: usize,
    /// Rows excluded for falling below the star threshold.
    pub below_threshold: usize,
}

impl TransformSummary {
    /// Total excluded rows; `written + excluded()` always equals `input`.
    #[must_use]
    pub fn excluded(&self) -> usize {
        self.missing_fields + self.bad_timestamp + self.below_threshold
    }
}

/// Result of a transform run.
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    /// Processed records, preserving input order.
    pub records: Vec<ProcessedRecord>,
    pub summary: TransformSummary,
}

/// Normalize raw rows into processed records.
///
/// Rows failing shape validation are excluded and counted, never silently
/// merged. Order is preserved.
#[must_use]
pub fn transform(rows: &[RawRow], options: &TransformOptions) -> TransformOutcome {
    let mut summary = TransformSummary {
        input: rows.len(),
        ..TransformSummary::default()
    };
    let mut records: Vec<ProcessedRecord> = Vec::with_capacity(rows.len());

    for row in rows {
        let (Some(id), Some(stars)) = (row.id, row.stars) else {
            summary.missing_fields += 1;
            tracing::warn!(full_name = %row.full_name, "excluding row with missing id or stars");
            continue;
        };

        let (Some(created_at), Some(pushed_at)) =
            (parse_timestamp(&row.created_at), parse_timestamp(&row.pushed_at))
        else {
            summary.bad_timestamp += 1;
            tracing::warn!(full_name = %row.full_name, "excluding row with uncoercible timestamp");
            continue;
        };

        if stars < options.min_stars {
            summary.below_threshold += 1;
            tracing::warn!(
                full_name = %row.full_name,
                stars,
                min_stars = options.min_stars,
                "excluding row below star threshold"
            );
            continue;
        }

        let forks = row.forks.unwrap_or(0);

        let repo_age_days = (options.as_of - created_at).num_days();
        let repo_age_years = repo_age_days as f64 / 365.0;
        let days_since_last_push = (options.as_of - pushed_at).num_days();

        records.push(ProcessedRecord {
            id,
            full_name: row.full_name.clone(),
            owner: row.owner.clone(),
            stars,
            forks,
            language: row.language.clone(),
            language_known: row.language.is_some(),
            created_at,
            pushed_at,
            license: row.license.clone(),
            url: row.url.clone(),
            repo_age_days,
            repo_age_years,
            days_since_last_push,
            is_active: days_since_last_push <= ACTIVE_WITHIN_DAYS,
            stars_per_year: stars as f64 / repo_age_years,
            forks_per_year: forks as f64 / repo_age_years,
            popularity_score: stars + 2 * forks,
            engagement_rate: (stars + forks) as f64 / repo_age_years,
            star_to_fork_ratio: stars as f64 / forks.max(1) as f64,
            category: PopularityBand::for_stars(stars),
            popularity_score_normalized: 0.0,
        });
    }

    normalize_popularity(&mut records);

    summary.written = records.len();
    TransformOutcome { records, summary }
}

/// Coerce a wire timestamp to UTC; empty or malformed strings are `None`.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Min–max normalize popularity scores over the batch to [0, 100].
///
/// A constant batch maps to 100 everywhere.
fn normalize_popularity(records: &mut [ProcessedRecord]) {
    let Some(min) = records.iter().map(|r| r.popularity_score).min() else {
        return;
    };
    let max = records
        .iter()
        .map(|r| r.popularity_score)
        .max()
        .unwrap_or(min);

    if min == max {
        for record in records.iter_mut() {
            record.popularity_score_normalized = 100.0;
        }
        return;
    }

    let span = (max - min) as f64;
    for record in records.iter_mut() {
        record.popularity_score_normalized =
            100.0 * (record.popularity_score - min) as f64 / span;
    }
}
