//! Deduplication of search results by info hash.

use std::collections::HashSet;

use super::NormalizedResult;

/// Tracks which info hashes have been seen.
#[derive(Debug, Default)]
pub struct SeenIds {
    seen: HashSet<String>,
}

impl SeenIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` and report whether this is its first sighting.
    ///
    /// Missing or blank ids can't collide with anything and always count as
    /// first sightings.
    pub fn first_sighting(&mut self, id: Option<&str>) -> bool {
        match id.map(str::trim) {
            Some(id) if !id.is_empty() => self.seen.insert(id.to_lowercase()),
            _ => true,
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Merge result lists in priority order, keeping the first result per info hash.
///
/// Results without a download ref are dropped. Results without a content id
/// are always kept. Returns the merged list and how many duplicates were
/// dropped.
pub fn merge_by_priority(lists: Vec<Vec<NormalizedResult>>) -> (Vec<NormalizedResult>, usize) {
    let mut seen = SeenIds::new();
    let mut merged = Vec::new();
    let mut duplicates = 0;

    for result in lists.into_iter().flatten() {
        if result.download_ref.is_empty() {
            continue;
        }
        if seen.first_sighting(result.content_id.as_deref()) {
            merged.push(result);
        } else {
            duplicates += 1;
        }
    }

    (merged, duplicates)
}
