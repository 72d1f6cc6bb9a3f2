//! Types for the torrent search system.

use async_trait::async_trait;
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::magnet::info_hash_from_magnet;

/// A search hit in the shape every source is normalized to.
///
/// Field order is the wire order of the search response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    /// Release name as reported by the source.
    pub title: String,
    pub seeders: u32,
    pub leechers: u32,
    pub size_bytes: u64,
    /// True when the download client already has this info hash.
    #[serde(default)]
    pub already_queued: bool,
    /// Magnet URI (or a source-specific URL) handed to the download client.
    pub download_ref: String,
    /// Lowercase info hash used for deduplication. `None` when unknown.
    #[serde(skip)]
    pub content_id: Option<String>,
}

impl NormalizedResult {
    /// Create a result, deriving the content id from a magnet download ref.
    pub fn new(title: impl Into<String>, download_ref: impl Into<String>) -> Self {
        let download_ref = download_ref.into();
        Self {
            title: title.into(),
            seeders: 0,
            leechers: 0,
            size_bytes: 0,
            already_queued: false,
            content_id: info_hash_from_magnet(&download_ref),
            download_ref,
        }
    }

    pub fn with_peers(mut self, seeders: u32, leechers: u32) -> Self {
        self.seeders = seeders;
        self.leechers = leechers;
        self
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    /// Override the content id with a hash reported by the source.
    ///
    /// Blank ids are ignored so a derived id is never replaced by nothing.
    pub fn with_content_id(mut self, content_id: &str) -> Self {
        let id = content_id.trim().to_lowercase();
        if !id.is_empty() {
            self.content_id = Some(id);
        }
        self
    }

    /// Fill in the download ref after link resolution.
    pub fn resolved(mut self, magnet: String) -> Self {
        if self.content_id.is_none() {
            self.content_id = info_hash_from_magnet(&magnet);
        }
        self.download_ref = magnet;
        self
    }
}

/// A hit whose magnet has to be scraped from a tracker page.
#[derive(Debug, Clone)]
pub struct UnresolvedCandidate {
    /// Everything known about the hit; `download_ref` is still empty.
    pub partial: NormalizedResult,
    /// Page fetched first.
    pub primary: String,
    /// Page fetched when the primary yields no magnet.
    pub fallback: Option<String>,
    /// Tracker's legacy page encoding, tried after UTF-8.
    pub legacy_encoding: &'static Encoding,
}

/// Output of one source for one query.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    /// Hits that already carry a download ref.
    pub results: Vec<NormalizedResult>,
    /// Hits that still need link resolution.
    pub unresolved: Vec<UnresolvedCandidate>,
}

impl SourceBatch {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.unresolved.is_empty()
    }
}

/// Per-source outcome of a search, for logs and the stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStats {
    pub name: String,
    /// Hits returned with a download ref.
    pub direct: usize,
    /// Hits that went to link resolution.
    pub unresolved: usize,
    /// Error message when the source failed (its contribution is empty).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Search summary with per-stage counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchStats {
    pub sources: Vec<SourceStats>,
    /// Candidates that resolved to a magnet.
    pub resolved: usize,
    /// Candidates dropped because no magnet was found.
    pub unresolved_dropped: usize,
    /// Results dropped because an earlier result had the same info hash.
    pub duplicates_dropped: usize,
    /// Results returned to the caller.
    pub returned: usize,
    pub duration_ms: u64,
}

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Search backend API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid search configuration: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SearchError {
    /// Classify a reqwest failure.
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else if e.is_connect() {
            SearchError::ConnectionFailed(e.to_string())
        } else {
            SearchError::ApiError(e.to_string())
        }
    }
}

/// A tracker or indexer that can be searched.
///
/// Implementations return only valid hits, deduplicated within the source.
/// Transport and parse failures are returned as errors; the aggregator
/// treats them as an empty contribution.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Source name for logging and metrics.
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<SourceBatch, SearchError>;
}
