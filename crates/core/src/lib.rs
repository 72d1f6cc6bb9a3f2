pub mod auth;
pub mod config;
pub mod metrics;
pub mod searcher;
pub mod testing;
pub mod torrent_client;

pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, Identity, NoneAuthenticator,
    SubsonicAuthenticator,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig, TorrentClientBackend,
};
pub use searcher::{
    Aggregator, ApibayClient, LinkResolver, LivenessAnnotator, NormalizedResult, ProwlarrClient,
    SearchError, SearchStats, SourceBatch, SourceClient, UnresolvedCandidate,
};
pub use torrent_client::{
    AddTorrentRequest, AddTorrentResult, QBittorrentClient, TorrentClient, TorrentClientError,
    TorrentFilters, TorrentInfo,
};
