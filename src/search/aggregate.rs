//! Deduplication and official-first ordering of search hits

use super::{SearchHit, SearchResult};
use std::collections::HashSet;

pub const MAX_RESULTS: usize = 10;

/// URL fragments that mark government or court-system sources
const OFFICIAL_MARKERS: &[&str] = &[".gov", "courts.state"];

pub fn is_official_url(url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    OFFICIAL_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Deduplicate by exact URL (first occurrence wins), stable-partition
/// official sources ahead of the rest, and cap at [`MAX_RESULTS`].
pub fn aggregate(hits: impl IntoIterator<Item = SearchHit>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    let (official, other): (Vec<SearchResult>, Vec<SearchResult>) = hits
        .into_iter()
        .filter(|hit| seen.insert(hit.url.clone()))
        .map(SearchResult::from)
        .partition(|result| result.is_gov_source);

    official.into_iter().chain(other).take(MAX_RESULTS).collect()
}
