//! Apibay (The Pirate Bay JSON API) source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ApibayConfig;

use super::dedup::SeenIds;
use super::lenient::{lenient_string, lenient_u32, lenient_u64};
use super::magnet::magnet_from_info_hash;
use super::{NormalizedResult, SearchError, SourceBatch, SourceClient};

/// Apibay answers "no results" with a single placeholder row carrying this id.
const NO_RESULTS_ID: &str = "0";

/// One row of `q.php` output. Apibay sends most numbers as strings.
#[derive(Debug, Deserialize)]
struct ApibayItem {
    #[serde(default, deserialize_with = "lenient_string")]
    id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    info_hash: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    seeders: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    leechers: u32,
    #[serde(default, deserialize_with = "lenient_u64")]
    size: u64,
}

impl ApibayItem {
    fn has_info_hash(&self) -> bool {
        let hash = self.info_hash.trim();
        !hash.is_empty() && !hash.chars().all(|c| c == '0')
    }
}

/// Client for the Apibay search endpoint.
///
/// Every hit carries an info hash, so results never need link resolution.
pub struct ApibayClient {
    client: Client,
    config: ApibayConfig,
}

impl ApibayClient {
    pub fn new(config: ApibayConfig, user_agent: &str) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(user_agent)
            .build()
            .map_err(|e| SearchError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn build_search_url(&self, query: &str) -> String {
        format!(
            "{}/q.php?q={}&cat={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(query),
            urlencoding::encode(&self.config.category)
        )
    }
}

/// Turn a decoded `q.php` body into results.
///
/// Anything other than an array is treated as "no results", as is the
/// placeholder row.
fn normalize_response(body: Value) -> Result<SourceBatch, SearchError> {
    let Value::Array(rows) = body else {
        return Ok(SourceBatch::default());
    };

    let items: Vec<ApibayItem> = serde_json::from_value(Value::Array(rows))
        .map_err(|e| SearchError::ApiError(format!("Failed to parse response: {}", e)))?;

    if items.len() == 1 && items[0].id == NO_RESULTS_ID {
        return Ok(SourceBatch::default());
    }

    let mut seen = SeenIds::new();
    let results = items
        .into_iter()
        .filter(ApibayItem::has_info_hash)
        .filter(|item| seen.first_sighting(Some(&item.info_hash)))
        .map(|item| {
            let title = if item.name.is_empty() {
                "Unknown".to_string()
            } else {
                item.name
            };
            let magnet = magnet_from_info_hash(&item.info_hash, &title);
            NormalizedResult::new(title, magnet)
                .with_content_id(&item.info_hash)
                .with_peers(item.seeders, item.leechers)
                .with_size(item.size)
        })
        .collect();

    Ok(SourceBatch {
        results,
        unresolved: Vec::new(),
    })
}

#[async_trait]
impl SourceClient for ApibayClient {
    fn name(&self) -> &str {
        "apibay"
    }

    async fn search(&self, query: &str) -> Result<SourceBatch, SearchError> {
        let url = self.build_search_url(query);
        debug!(query = query, "Searching Apibay");

        let response = self
            .client
            .get(&url)
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

        let batch = normalize_response(body)?;
        debug!(results = batch.results.len(), "Apibay search complete");
        Ok(batch)
    }
}
