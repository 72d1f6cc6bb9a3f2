//! Testing utilities and mock implementations.
//!
//! Mocks for the search source and download client traits, so the
//! aggregator and the HTTP layer can be exercised without trackers or a
//! running qBittorrent.
//!
//! # Example
//!
//! ```rust,ignore
//! use musicreq_core::testing::{fixtures, MockSource, MockTorrentClient};
//!
//! let source = MockSource::new("apibay");
//! source.set_results(vec![fixtures::result("Discovery", &fixtures::info_hash(1))]).await;
//!
//! let torrent_client = MockTorrentClient::with_hashes(&["abc"]).await;
//! ```

mod mock_source;
mod mock_torrent_client;

pub use mock_source::MockSource;
pub use mock_torrent_client::MockTorrentClient;

/// Test fixtures and helper functions.
pub mod fixtures {
    use encoding_rs::WINDOWS_1251;

    use crate::searcher::magnet::magnet_from_info_hash;
    use crate::searcher::{NormalizedResult, UnresolvedCandidate};

    /// A distinct 40-character info hash for `n`.
    pub fn info_hash(n: u32) -> String {
        format!("{:040x}", n)
    }

    /// A resolved result with reasonable defaults.
    pub fn result(title: &str, info_hash: &str) -> NormalizedResult {
        NormalizedResult::new(title, magnet_from_info_hash(info_hash, title))
            .with_peers(50, 10)
            .with_size(1024 * 1024 * 100) // 100 MB
    }

    /// A candidate pointing at a tracker page, with an optional fallback.
    pub fn candidate(title: &str, primary: &str, fallback: Option<&str>) -> UnresolvedCandidate {
        UnresolvedCandidate {
            partial: NormalizedResult::new(title, "").with_peers(5, 1),
            primary: primary.to_string(),
            fallback: fallback.map(str::to_string),
            legacy_encoding: WINDOWS_1251,
        }
    }

    /// An HTML page carrying `magnet` in an anchor.
    pub fn tracker_page(magnet: &str) -> String {
        format!(
            r#"<html><body><a class="magnet-link" href="{}">Скачать</a></body></html>"#,
            magnet
        )
    }
}
