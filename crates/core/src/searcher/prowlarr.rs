//! Prowlarr multi-indexer source.

use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::Encoding;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::ProwlarrConfig;

use super::dedup::SeenIds;
use super::lenient::{string_from_value, u32_from_value, u64_from_value};
use super::magnet::magnet_from_info_hash;
use super::{NormalizedResult, SearchError, SourceBatch, SourceClient, UnresolvedCandidate};

/// One Prowlarr release, read leniently.
///
/// Indexer proxies disagree on field names (`infoHash` vs `info_hash`,
/// `guid` vs `link`, ...), so each field takes the first non-empty alias.
#[derive(Debug, Default)]
struct ProwlarrItem {
    title: String,
    info_hash: String,
    magnet: Option<String>,
    guid: Option<String>,
    download_url: Option<String>,
    seeders: u32,
    leechers: u32,
    size: u64,
}

fn first_string(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find_map(string_from_value)
}

fn first_value<'a>(object: &'a Map<String, Value>, key: &str) -> &'a Value {
    object.get(key).unwrap_or(&Value::Null)
}

impl ProwlarrItem {
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self {
            title: first_string(object, &["title", "name"]).unwrap_or_else(|| "Unknown".to_string()),
            info_hash: first_string(object, &["infoHash", "info_hash"])
                .map(|h| h.trim().to_lowercase())
                .unwrap_or_default(),
            magnet: first_string(object, &["magnetUrl", "magnet_url", "magnet"]),
            guid: first_string(object, &["guid", "link"]),
            download_url: first_string(object, &["downloadUrl", "download_url"]),
            seeders: u32_from_value(first_value(object, "seeders")),
            leechers: u32_from_value(first_value(object, "leechers")),
            size: u64_from_value(first_value(object, "size")),
        })
    }

    fn partial(&self, download_ref: String) -> NormalizedResult {
        NormalizedResult::new(self.title.clone(), download_ref)
            .with_content_id(&self.info_hash)
            .with_peers(self.seeders, self.leechers)
            .with_size(self.size)
    }
}

/// Client for Prowlarr's aggregated `/api/v1/search`.
///
/// Releases without a magnet or info hash whose `guid` points at one of the
/// configured resolve hosts come back as [`UnresolvedCandidate`]s; other
/// magnet-less releases are dropped.
pub struct ProwlarrClient {
    client: Client,
    config: ProwlarrConfig,
    legacy_encoding: &'static Encoding,
}

impl ProwlarrClient {
    pub fn new(config: ProwlarrConfig, user_agent: &str) -> Result<Self, SearchError> {
        let legacy_encoding = Encoding::for_label(config.legacy_encoding.as_bytes())
            .ok_or_else(|| {
                SearchError::Configuration(format!(
                    "Unknown page encoding: {}",
                    config.legacy_encoding
                ))
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(user_agent)
            .build()
            .map_err(|e| SearchError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            config,
            legacy_encoding,
        })
    }

    fn build_search_url(&self, query: &str) -> String {
        let mut url = format!(
            "{}/api/v1/search?query={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(query)
        );
        for category in &self.config.categories {
            url.push_str(&format!("&categories={}", category));
        }
        url
    }

    fn needs_resolution(&self, guid: &str) -> bool {
        let guid = guid.to_lowercase();
        self.config
            .resolve_hosts
            .iter()
            .any(|host| !host.is_empty() && guid.contains(&host.to_lowercase()))
    }

    fn normalize_response(&self, body: Value) -> SourceBatch {
        let Value::Array(rows) = body else {
            return SourceBatch::default();
        };

        let mut seen = SeenIds::new();
        let mut batch = SourceBatch::default();

        for item in rows.iter().filter_map(ProwlarrItem::from_value) {
            let magnet = item.magnet.clone().or_else(|| {
                (!item.info_hash.is_empty())
                    .then(|| magnet_from_info_hash(&item.info_hash, &item.title))
            });

            match magnet {
                Some(magnet) => {
                    let result = item.partial(magnet);
                    if seen.first_sighting(result.content_id.as_deref()) {
                        batch.results.push(result);
                    }
                }
                None => match &item.guid {
                    Some(guid) if self.needs_resolution(guid) => {
                        batch.unresolved.push(UnresolvedCandidate {
                            partial: item.partial(String::new()),
                            primary: guid.clone(),
                            fallback: item.download_url.clone(),
                            legacy_encoding: self.legacy_encoding,
                        });
                    }
                    _ => debug!(title = %item.title, "Dropping release without magnet"),
                },
            }
        }

        batch
    }
}

#[async_trait]
impl SourceClient for ProwlarrClient {
    fn name(&self) -> &str {
        "prowlarr"
    }

    async fn search(&self, query: &str) -> Result<SourceBatch, SearchError> {
        let url = self.build_search_url(query);
        debug!(query = query, "Searching Prowlarr");

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.config.api_key)
            .send()
            .await
            .map_err(SearchError::from_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::ApiError(format!("Failed to parse response: {}", e)))?;

        let batch = self.normalize_response(body);
        debug!(
            results = batch.results.len(),
            unresolved = batch.unresolved.len(),
            "Prowlarr search complete"
        );
        Ok(batch)
    }
}
