//! Conversion from search API wire types to pipeline records.

use crate::record::RepoRecord;

use super::types::SearchItem;

/// Convert a search item to the raw record shape.
///
/// Timestamps stay in wire form here; coercion to canonical date-times is
/// the transformer's job.
#[must_use]
pub fn to_repo_record(item: &SearchItem) -> RepoRecord {
    let owner = item
        .owner
        .as_ref()
        .map(|o| o.login.clone())
        .unwrap_or_default();

    let license = item.license.as_ref().and_then(|l| l.spdx_id.clone());

    RepoRecord {
        id: item.id,
        full_name: item.full_name.clone(),
        owner,
        stars: item.stargazers_count,
        forks: item.forks_count,
        language: item.language.clone(),
        created_at: item.created_at.clone().unwrap_or_default(),
        pushed_at: item.pushed_at.clone().unwrap_or_default(),
        license,
        url: item.html_url.clone(),
    }
}
