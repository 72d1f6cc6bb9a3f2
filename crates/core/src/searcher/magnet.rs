//! Magnet URI helpers.

/// Marker preceding the info hash in a magnet's `xt` parameter.
pub const INFO_HASH_MARKER: &str = "btih:";

/// Length of a hex-encoded SHA-1 info hash.
pub const INFO_HASH_LEN: usize = 40;

/// Extract the info hash (lowercase) from a magnet URI.
///
/// Takes the token after `btih:` up to the next `&` or `?`, trimmed and cut
/// to 40 characters. Base32 hashes pass through lowercased.
pub fn info_hash_from_magnet(magnet: &str) -> Option<String> {
    let (_, rest) = magnet.split_once(INFO_HASH_MARKER)?;
    let token = rest.split(['&', '?']).next().unwrap_or_default().trim();
    let hash: String = token
        .chars()
        .take(INFO_HASH_LEN)
        .collect::<String>()
        .to_lowercase();

    if hash.is_empty() {
        None
    } else {
        Some(hash)
    }
}

/// Build a magnet URI from an info hash and a display name.
pub fn magnet_from_info_hash(info_hash: &str, name: &str) -> String {
    format!(
        "magnet:?xt=urn:btih:{}&dn={}",
        info_hash.trim().to_lowercase(),
        urlencoding::encode(name)
    )
}
