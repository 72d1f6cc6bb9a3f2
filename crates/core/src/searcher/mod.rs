//! Multi-source torrent search.
//!
//! Each tracker source is a [`SourceClient`]. The [`Aggregator`] queries all
//! of them concurrently, scrapes magnets for results that only link to a
//! tracker page ([`LinkResolver`]), merges everything in source priority
//! order while dropping duplicate info hashes, and finally marks results
//! the download client already has ([`LivenessAnnotator`]).

mod aggregator;
mod apibay;
mod decode;
mod dedup;
mod lenient;
mod liveness;
pub mod magnet;
mod prowlarr;
mod resolver;
mod types;

pub use aggregator::Aggregator;
pub use apibay::ApibayClient;
pub use decode::{DecodeAttempt, DecodeChain};
pub use dedup::{merge_by_priority, SeenIds};
pub use liveness::{DownloadClientSnapshot, LivenessAnnotator};
pub use prowlarr::ProwlarrClient;
pub use resolver::{extract_magnet, LinkResolver};
pub use types::*;
