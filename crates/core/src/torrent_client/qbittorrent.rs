//! qBittorrent torrent client implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;
use tracing::debug;

use crate::config::QBittorrentConfig;
use crate::searcher::magnet::info_hash_from_magnet;

use super::{
    AddTorrentRequest, AddTorrentResult, TorrentClient, TorrentClientError, TorrentFilters,
    TorrentInfo,
};

/// qBittorrent client implementation.
///
/// Every operation logs in on a fresh cookie jar, so an expired or revoked
/// session never outlives a single call.
pub struct QBittorrentClient {
    config: QBittorrentConfig,
    user_agent: String,
}

/// An authenticated WebUI session.
struct Session {
    client: Client,
    base_url: String,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(config: QBittorrentConfig, user_agent: impl Into<String>) -> Self {
        Self {
            config,
            user_agent: user_agent.into(),
        }
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Open a session: new HTTP client with its own cookie store, then login.
    async fn login(&self) -> Result<Session, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs as u64))
            .cookie_store(true)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| TorrentClientError::ConnectionFailed(e.to_string()))?;

        let url = format!("{}/api/v2/auth/login", self.base_url());
        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(TorrentClientError::from_transport)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            Ok(Session {
                client,
                base_url: self.base_url().to_string(),
            })
        } else if body.contains("Fails.") || status.as_u16() == 403 {
            Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(TorrentClientError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }
}

impl Session {
    async fn get(&self, endpoint: &str) -> Result<String, TorrentClientError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(TorrentClientError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| TorrentClientError::ApiError(e.to_string()))
    }

    async fn post_multipart(
        &self,
        endpoint: &str,
        form: multipart::Form,
    ) -> Result<String, TorrentClientError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(TorrentClientError::from_transport)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TorrentClientError::ApiError(e.to_string()))?;

        if !status.is_success() {
            return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
        }
        // torrents/add answers 200 "Fails." when it rejects every URL
        if body.contains("Fails.") {
            return Err(TorrentClientError::InvalidRequest(
                "qBittorrent rejected the torrent".to_string(),
            ));
        }

        Ok(body)
    }
}

/// qBittorrent torrent info response (fields we use).
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    progress: f64,
    #[serde(default)]
    size: i64,
    #[serde(default)]
    category: String,
}

impl QBTorrentInfo {
    fn into_torrent_info(self) -> TorrentInfo {
        TorrentInfo {
            hash: self.hash.to_lowercase(),
            name: self.name,
            progress: self.progress,
            size_bytes: self.size.max(0) as u64,
            category: if self.category.is_empty() {
                None
            } else {
                Some(self.category)
            },
        }
    }
}

#[async_trait]
impl TorrentClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError> {
        let category = request
            .category
            .unwrap_or_else(|| self.config.category.clone());

        let mut form = multipart::Form::new().text("urls", request.uri.clone());
        if !category.is_empty() {
            form = form.text("category", category);
        }
        if request.paused {
            form = form.text("paused", "true");
        }

        let session = self.login().await?;
        session.post_multipart("/api/v2/torrents/add", form).await?;

        Ok(AddTorrentResult {
            hash: info_hash_from_magnet(&request.uri).unwrap_or_default(),
        })
    }

    async fn list_torrents(
        &self,
        filters: &TorrentFilters,
    ) -> Result<Vec<TorrentInfo>, TorrentClientError> {
        let mut endpoint = "/api/v2/torrents/info".to_string();
        if let Some(category) = &filters.category {
            endpoint.push_str(&format!("?category={}", urlencoding::encode(category)));
        }

        let session = self.login().await?;
        let response = session.get(&endpoint).await?;
        let torrents: Vec<QBTorrentInfo> = serde_json::from_str(&response).map_err(|e| {
            TorrentClientError::ApiError(format!("Failed to parse response: {}", e))
        })?;

        Ok(torrents
            .into_iter()
            .map(QBTorrentInfo::into_torrent_info)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: &str) -> QBittorrentConfig {
        QBittorrentConfig {
            url: url.to_string(),
            username: "admin".to_string(),
            password: "adminadmin".to_string(),
            category: "lidarr".to_string(),
            timeout_secs: 5,
        }
    }

    async fn mount_login(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/v2/auth/login"))
            .and(body_string_contains("username=admin"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "SID=session123; path=/")
                    .set_body_string("Ok."),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_qb_torrent_info_conversion() {
        let qb_info: QBTorrentInfo = serde_json::from_str(
            r#"{"hash":"ABC123","name":"Test Torrent","progress":0.5,"size":1000000,
                "category":"lidarr","state":"downloading","dlspeed":10}"#,
        )
        .unwrap();

        let info = qb_info.into_torrent_info();
        assert_eq!(info.hash, "abc123"); // lowercase
        assert_eq!(info.name, "Test Torrent");
        assert!((info.progress - 0.5).abs() < 0.001);
        assert_eq!(info.size_bytes, 1000000);
        assert_eq!(info.category, Some("lidarr".to_string()));
    }

    #[test]
    fn test_qb_torrent_info_empty_category() {
        let qb_info: QBTorrentInfo =
            serde_json::from_str(r#"{"hash":"abc","category":"","size":-1}"#).unwrap();
        let info = qb_info.into_torrent_info();
        assert!(info.category.is_none());
        assert_eq!(info.size_bytes, 0);
    }

    #[tokio::test]
    async fn test_list_torrents() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v2/torrents/info"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"hash":"AAAA","name":"One","progress":1.0,"size":10,"category":"lidarr"},
                    {"hash":"bbbb","name":"Two","progress":0.1,"size":20,"category":""}]"#,
            ))
            .mount(&server)
            .await;

        let client = QBittorrentClient::new(config(&server.uri()), "test");
        let torrents = client
            .list_torrents(&TorrentFilters::default())
            .await
            .unwrap();

        let hashes: Vec<_> = torrents.iter().map(|t| t.hash.as_str()).collect();
        assert_eq!(hashes, vec!["aaaa", "bbbb"]);
    }

    #[tokio::test]
    async fn test_list_torrents_category_filter() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v2/torrents/info"))
            .and(query_param("category", "lidarr"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let client = QBittorrentClient::new(config(&server.uri()), "test");
        let torrents = client
            .list_torrents(&TorrentFilters {
                category: Some("lidarr".to_string()),
            })
            .await
            .unwrap();

        assert!(torrents.is_empty());
    }

    #[tokio::test]
    async fn test_each_call_logs_in() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Ok."))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/torrents/info"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let client = QBittorrentClient::new(config(&server.uri()), "test");
        client.list_torrents(&TorrentFilters::default()).await.unwrap();
        client.list_torrents(&TorrentFilters::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Fails."))
            .mount(&server)
            .await;

        let client = QBittorrentClient::new(config(&server.uri()), "test");
        let result = client.list_torrents(&TorrentFilters::default()).await;

        assert!(matches!(
            result,
            Err(TorrentClientError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_add_torrent_uses_configured_category() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/v2/torrents/add"))
            .and(body_string_contains("magnet:?xt=urn:btih:ABCDEF"))
            .and(body_string_contains("lidarr"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Ok."))
            .expect(1)
            .mount(&server)
            .await;

        let client = QBittorrentClient::new(config(&server.uri()), "test");
        let result = client
            .add_torrent(AddTorrentRequest::magnet("magnet:?xt=urn:btih:ABCDEF&dn=x"))
            .await
            .unwrap();

        assert_eq!(result.hash, "abcdef");
    }

    #[tokio::test]
    async fn test_add_torrent_rejected() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/v2/torrents/add"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Fails."))
            .mount(&server)
            .await;

        let client = QBittorrentClient::new(config(&server.uri()), "test");
        let result = client
            .add_torrent(AddTorrentRequest::magnet("magnet:?xt=urn:btih:abc"))
            .await;

        assert!(matches!(result, Err(TorrentClientError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_unreachable_client() {
        let client = QBittorrentClient::new(config("http://127.0.0.1:1"), "test");
        let result = client.list_torrents(&TorrentFilters::default()).await;
        assert!(matches!(result, Err(TorrentClientError::ConnectionFailed(_))));
    }
}
