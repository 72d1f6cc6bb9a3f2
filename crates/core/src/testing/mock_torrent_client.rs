//! Mock torrent client for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::searcher::magnet::info_hash_from_magnet;
use crate::torrent_client::{
    AddTorrentRequest, AddTorrentResult, TorrentClient, TorrentClientError, TorrentFilters,
    TorrentInfo,
};

/// Mock implementation of the TorrentClient trait.
///
/// Provides controllable behavior for testing:
/// - Track added torrents for assertions
/// - Seed the torrent list
/// - Simulate failures
///
/// # Example
///
/// ```rust,ignore
/// let client = MockTorrentClient::new();
///
/// client.add_torrent(AddTorrentRequest::magnet("magnet:?xt=urn:btih:abc")).await?;
///
/// let added = client.added_torrents().await;
/// assert_eq!(added.len(), 1);
/// assert!(client.has_torrent("abc").await);
/// ```
#[derive(Debug, Default)]
pub struct MockTorrentClient {
    /// Recorded add_torrent calls.
    added: Arc<RwLock<Vec<AddTorrentRequest>>>,
    /// Current torrents by hash.
    torrents: Arc<RwLock<HashMap<String, TorrentInfo>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<TorrentClientError>>>,
}

impl MockTorrentClient {
    /// Create a new mock torrent client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose list already contains these hashes.
    pub async fn with_hashes(hashes: &[&str]) -> Self {
        let client = Self::new();
        for hash in hashes {
            client.add_mock_torrent(hash, "existing").await;
        }
        client
    }

    /// Get all recorded add_torrent requests.
    pub async fn added_torrents(&self) -> Vec<AddTorrentRequest> {
        self.added.read().await.clone()
    }

    /// Set an error to be returned by the next operation.
    pub async fn set_next_error(&self, error: TorrentClientError) {
        *self.next_error.write().await = Some(error);
    }

    /// Check if a torrent exists.
    pub async fn has_torrent(&self, hash: &str) -> bool {
        self.torrents.read().await.contains_key(&hash.to_lowercase())
    }

    /// Put a torrent in the list directly.
    pub async fn add_mock_torrent(&self, hash: &str, name: &str) {
        let hash = hash.to_lowercase();
        self.torrents.write().await.insert(
            hash.clone(),
            TorrentInfo {
                hash,
                name: name.to_string(),
                progress: 0.0,
                size_bytes: 0,
                category: None,
            },
        );
    }

    async fn take_error(&self) -> Option<TorrentClientError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }

        self.added.write().await.push(request.clone());

        let hash = info_hash_from_magnet(&request.uri).ok_or_else(|| {
            TorrentClientError::InvalidRequest(format!("No info hash in {}", request.uri))
        })?;

        self.torrents.write().await.insert(
            hash.clone(),
            TorrentInfo {
                hash: hash.clone(),
                name: String::new(),
                progress: 0.0,
                size_bytes: 0,
                category: request.category.clone(),
            },
        );

        Ok(AddTorrentResult { hash })
    }

    async fn list_torrents(
        &self,
        filters: &TorrentFilters,
    ) -> Result<Vec<TorrentInfo>, TorrentClientError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }

        let torrents = self.torrents.read().await;
        let mut list: Vec<TorrentInfo> = torrents
            .values()
            .filter(|t| match &filters.category {
                Some(category) => t.category.as_ref() == Some(category),
                None => true,
            })
            .cloned()
            .collect();
        list.sort_by(|a, b| a.hash.cmp(&b.hash));
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_list() {
        let client = MockTorrentClient::new();
        let result = client
            .add_torrent(AddTorrentRequest::magnet("magnet:?xt=urn:btih:ABC&dn=x").with_category("lidarr"))
            .await
            .unwrap();

        assert_eq!(result.hash, "abc");
        assert!(client.has_torrent("abc").await);
        assert_eq!(client.added_torrents().await.len(), 1);

        let filtered = client
            .list_torrents(&TorrentFilters {
                category: Some("lidarr".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[tokio::test]
    async fn test_error_injection() {
        let client = MockTorrentClient::with_hashes(&["aaa"]).await;
        client
            .set_next_error(TorrentClientError::ConnectionFailed("down".to_string()))
            .await;

        assert!(client.list_torrents(&TorrentFilters::default()).await.is_err());
        // Error is consumed
        assert_eq!(
            client
                .list_torrents(&TorrentFilters::default())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_add_without_hash_rejected() {
        let client = MockTorrentClient::new();
        let result = client
            .add_torrent(AddTorrentRequest::magnet("magnet:?dn=nothing"))
            .await;
        assert!(matches!(result, Err(TorrentClientError::InvalidRequest(_))));
    }
}
