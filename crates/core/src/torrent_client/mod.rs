//! Download client abstraction.
//!
//! This module provides a `TorrentClient` trait for the download client that
//! receives magnets and whose torrent list drives the "already queued" flag.

mod qbittorrent;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use types::*;
