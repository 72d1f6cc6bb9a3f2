//! "Already queued" marking against the download client.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::metrics;
use crate::torrent_client::{TorrentClient, TorrentFilters};

use super::magnet::info_hash_from_magnet;
use super::NormalizedResult;

/// Info hashes the download client knows about at one point in time.
#[derive(Debug, Clone, Default)]
pub struct DownloadClientSnapshot {
    hashes: HashSet<String>,
}

impl DownloadClientSnapshot {
    pub fn new<I, S>(hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hashes: hashes
                .into_iter()
                .map(|h| h.as_ref().trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Set `already_queued` on each result whose magnet hash is in the snapshot.
    ///
    /// Results without a hash in their download ref are left unflagged.
    pub fn apply(&self, results: Vec<NormalizedResult>) -> Vec<NormalizedResult> {
        results
            .into_iter()
            .map(|mut result| {
                result.already_queued = info_hash_from_magnet(&result.download_ref)
                    .map(|hash| self.contains(&hash))
                    .unwrap_or(false);
                result
            })
            .collect()
    }
}

/// Marks results the download client already has.
///
/// Lookup failures (or no configured client) leave every result unflagged.
#[derive(Clone, Default)]
pub struct LivenessAnnotator {
    client: Option<Arc<dyn TorrentClient>>,
}

impl LivenessAnnotator {
    pub fn new(client: Option<Arc<dyn TorrentClient>>) -> Self {
        Self { client }
    }

    /// Fetch the client's current hashes in one call.
    pub async fn snapshot(&self) -> DownloadClientSnapshot {
        let Some(client) = &self.client else {
            return DownloadClientSnapshot::default();
        };

        match client.list_torrents(&TorrentFilters::default()).await {
            Ok(torrents) => {
                let snapshot = DownloadClientSnapshot::new(torrents.iter().map(|t| &t.hash));
                debug!(
                    client = client.name(),
                    torrents = snapshot.len(),
                    "Fetched download client snapshot"
                );
                snapshot
            }
            Err(e) => {
                metrics::ANNOTATION_FAILURES.inc();
                warn!(client = client.name(), error = %e, "Could not list torrents, results left unflagged");
                DownloadClientSnapshot::default()
            }
        }
    }

    pub async fn annotate(&self, results: Vec<NormalizedResult>) -> Vec<NormalizedResult> {
        if results.is_empty() {
            return results;
        }
        self.snapshot().await.apply(results)
    }
}

impl std::fmt::Debug for LivenessAnnotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivenessAnnotator")
            .field("client", &self.client.as_ref().map(|c| c.name().to_string()))
            .finish()
    }
}
