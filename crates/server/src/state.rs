use std::sync::Arc;
use std::time::Duration;

use musicreq_core::{Aggregator, Authenticator, Config, SanitizedConfig, TorrentClient};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    aggregator: Arc<Aggregator>,
    torrent_client: Option<Arc<dyn TorrentClient>>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        aggregator: Arc<Aggregator>,
        torrent_client: Option<Arc<dyn TorrentClient>>,
    ) -> Self {
        Self {
            config,
            authenticator,
            aggregator,
            torrent_client,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn aggregator(&self) -> &Aggregator {
        self.aggregator.as_ref()
    }

    pub fn torrent_client(&self) -> Option<&Arc<dyn TorrentClient>> {
        self.torrent_client.as_ref()
    }

    /// Budget for a whole search request, if one is configured.
    pub fn search_deadline(&self) -> Option<Duration> {
        self.config
            .server
            .search_deadline_secs
            .map(|secs| Duration::from_secs(secs as u64))
    }
}
