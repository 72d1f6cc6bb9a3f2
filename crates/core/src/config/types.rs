use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub torrent_client: Option<TorrentClientConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Overall budget for one search request. Late results are discarded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_deadline_secs: Option<u32>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            search_deadline_secs: None,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8000
}

/// Outbound HTTP settings shared by every client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    "MusicRequests/1.0".to_string()
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Subsonic-compatible media server (required when method = "subsonic")
    #[serde(default)]
    pub subsonic: Option<SubsonicConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    Subsonic,
}

/// Subsonic/Airsonic credential check configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubsonicConfig {
    /// Media server base URL (e.g., "https://music.example.com")
    pub url: String,
    /// Subsonic API version sent with the ping
    #[serde(default = "default_subsonic_api_version")]
    pub api_version: String,
    /// Client name sent with the ping
    #[serde(default = "default_subsonic_client_name")]
    pub client_name: String,
    /// Request timeout in seconds (default: 15)
    #[serde(default = "default_subsonic_timeout")]
    pub timeout_secs: u32,
}

fn default_subsonic_api_version() -> String {
    "1.15.0".to_string()
}

fn default_subsonic_client_name() -> String {
    "music-requests".to_string()
}

fn default_subsonic_timeout() -> u32 {
    15
}

/// Tracker sources, queried in priority order: apibay first, then Prowlarr.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub apibay: ApibayConfig,
    #[serde(default)]
    pub prowlarr: Option<ProwlarrConfig>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            apibay: ApibayConfig::default(),
            prowlarr: None,
        }
    }
}

/// Apibay (The Pirate Bay JSON API) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApibayConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_apibay_url")]
    pub url: String,
    /// Apibay category code ("0" = all)
    #[serde(default = "default_apibay_category")]
    pub category: String,
    /// Request timeout in seconds (default: 15)
    #[serde(default = "default_apibay_timeout")]
    pub timeout_secs: u32,
}

impl Default for ApibayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_apibay_url(),
            category: default_apibay_category(),
            timeout_secs: default_apibay_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_apibay_url() -> String {
    "https://apibay.org".to_string()
}

fn default_apibay_category() -> String {
    "0".to_string()
}

fn default_apibay_timeout() -> u32 {
    15
}

/// Prowlarr multi-indexer proxy configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProwlarrConfig {
    /// Prowlarr server URL (e.g., "http://prowlarr:9696")
    #[serde(default)]
    pub url: String,
    /// Prowlarr API key
    #[serde(default)]
    pub api_key: String,
    /// Newznab category IDs (default: [3000] = audio)
    #[serde(default = "default_prowlarr_categories")]
    pub categories: Vec<u32>,
    /// Request timeout in seconds (default: 60)
    #[serde(default = "default_prowlarr_timeout")]
    pub timeout_secs: u32,
    /// Hosts whose result pages must be scraped for a magnet
    #[serde(default = "default_resolve_hosts")]
    pub resolve_hosts: Vec<String>,
    /// Charset those pages fall back to when they are not UTF-8
    #[serde(default = "default_legacy_encoding")]
    pub legacy_encoding: String,
}

impl ProwlarrConfig {
    /// Prowlarr is only queried when both URL and API key are set.
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

fn default_prowlarr_categories() -> Vec<u32> {
    vec![3000]
}

fn default_prowlarr_timeout() -> u32 {
    60
}

fn default_resolve_hosts() -> Vec<String> {
    vec!["rutracker".to_string()]
}

fn default_legacy_encoding() -> String {
    "windows-1251".to_string()
}

/// Link resolver configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Page fetch timeout in seconds (default: 10)
    #[serde(default = "default_resolver_timeout")]
    pub timeout_secs: u32,
    /// Maximum page fetches in flight for one search (default: 8)
    #[serde(default = "default_resolver_concurrency")]
    pub max_concurrent: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_resolver_timeout(),
            max_concurrent: default_resolver_concurrency(),
        }
    }
}

fn default_resolver_timeout() -> u32 {
    10
}

fn default_resolver_concurrency() -> usize {
    8
}

/// Download client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TorrentClientConfig {
    pub backend: TorrentClientBackend,
    #[serde(default)]
    pub qbittorrent: Option<QBittorrentConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TorrentClientBackend {
    #[serde(rename = "qbittorrent")]
    QBittorrent,
}

/// qBittorrent Web API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Web UI URL (e.g., "http://qbittorrent:5080")
    pub url: String,
    #[serde(default = "default_qbit_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Category assigned to torrents added through this service
    #[serde(default = "default_qbit_category")]
    pub category: String,
    /// Request timeout in seconds (default: 15)
    #[serde(default = "default_qbit_timeout")]
    pub timeout_secs: u32,
}

fn default_qbit_username() -> String {
    "admin".to_string()
}

fn default_qbit_category() -> String {
    "lidarr".to_string()
}

fn default_qbit_timeout() -> u32 {
    15
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub sources: SanitizedSourcesConfig,
    pub resolver: ResolverConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torrent_client: Option<SanitizedTorrentClientConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsonic_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSourcesConfig {
    pub apibay: ApibayConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prowlarr: Option<SanitizedProwlarrConfig>,
}

/// Sanitized Prowlarr config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProwlarrConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub categories: Vec<u32>,
    pub timeout_secs: u32,
}

/// Sanitized qBittorrent config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTorrentClientConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::Subsonic => "subsonic".to_string(),
                },
                subsonic_url: config.auth.subsonic.as_ref().map(|s| s.url.clone()),
            },
            server: config.server.clone(),
            sources: SanitizedSourcesConfig {
                apibay: config.sources.apibay.clone(),
                prowlarr: config
                    .sources
                    .prowlarr
                    .as_ref()
                    .map(|p| SanitizedProwlarrConfig {
                        url: p.url.clone(),
                        api_key_configured: !p.api_key.is_empty(),
                        categories: p.categories.clone(),
                        timeout_secs: p.timeout_secs,
                    }),
            },
            resolver: config.resolver.clone(),
            torrent_client: config
                .torrent_client
                .as_ref()
                .map(|tc| SanitizedTorrentClientConfig {
                    backend: match tc.backend {
                        TorrentClientBackend::QBittorrent => "qbittorrent".to_string(),
                    },
                    url: tc.qbittorrent.as_ref().map(|q| q.url.clone()),
                    category: tc.qbittorrent.as_ref().map(|q| q.category.clone()),
                }),
        }
    }
}
