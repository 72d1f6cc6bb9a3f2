use super::{
    types::{AuthMethod, Config, TorrentClientBackend},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Subsonic auth has a [auth.subsonic] section
/// - Timeouts and the resolver concurrency cap are non-zero
/// - The Prowlarr legacy encoding label is known
/// - The selected torrent client backend has its section
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.server.search_deadline_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "server.search_deadline_secs cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::Subsonic && config.auth.subsonic.is_none() {
        return Err(ConfigError::ValidationError(
            "auth.subsonic must be set when using subsonic auth method".to_string(),
        ));
    }

    let apibay = &config.sources.apibay;
    if apibay.enabled && apibay.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "sources.apibay.timeout_secs cannot be 0".to_string(),
        ));
    }

    if let Some(prowlarr) = &config.sources.prowlarr {
        if prowlarr.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "sources.prowlarr.timeout_secs cannot be 0".to_string(),
            ));
        }
        if encoding_rs::Encoding::for_label(prowlarr.legacy_encoding.as_bytes()).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "sources.prowlarr.legacy_encoding '{}' is not a known encoding",
                prowlarr.legacy_encoding
            )));
        }
    }

    if config.resolver.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "resolver.timeout_secs cannot be 0".to_string(),
        ));
    }
    if config.resolver.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "resolver.max_concurrent cannot be 0".to_string(),
        ));
    }

    if let Some(tc) = &config.torrent_client {
        match tc.backend {
            TorrentClientBackend::QBittorrent if tc.qbittorrent.is_none() => {
                return Err(ConfigError::ValidationError(
                    "torrent_client.qbittorrent must be set when backend = \"qbittorrent\""
                        .to_string(),
                ));
            }
            TorrentClientBackend::QBittorrent => {}
        }
    }

    Ok(())
}
