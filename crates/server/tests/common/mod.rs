//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock sources and a mock download client injected, so the HTTP layer
//! can be exercised without trackers or qBittorrent.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use musicreq_core::{
    create_authenticator, load_config_from_str, Aggregator, Authenticator, LinkResolver,
    LivenessAnnotator, SourceClient, TorrentClient,
    testing::{MockSource, MockTorrentClient},
};
use musicreq_server::state::AppState;

/// Re-export fixtures for test convenience
pub use musicreq_core::testing::fixtures;

/// Test fixture for E2E testing with mock dependencies.
///
/// Two mock sources are registered in priority order, `primary` then
/// `secondary`.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Highest priority source
    pub primary: Arc<MockSource>,
    /// Lower priority source
    pub secondary: Arc<MockSource>,
    /// Mock download client (only wired in when enabled)
    pub torrent_client: Arc<MockTorrentClient>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

/// Knobs for the fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub with_torrent_client: bool,
    pub search_deadline_secs: Option<u32>,
    /// Use Subsonic auth against this base URL instead of no auth.
    pub subsonic_url: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            with_torrent_client: true,
            search_deadline_secs: None,
            subsonic_url: None,
        }
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let mut toml = String::new();
        match &test_config.subsonic_url {
            Some(url) => toml.push_str(&format!(
                "[auth]\nmethod = \"subsonic\"\n\n[auth.subsonic]\nurl = \"{}\"\ntimeout_secs = 5\n",
                url
            )),
            None => toml.push_str("[auth]\nmethod = \"none\"\n"),
        }
        toml.push_str("\n[server]\nhost = \"127.0.0.1\"\nport = 8000\n");
        if let Some(secs) = test_config.search_deadline_secs {
            toml.push_str(&format!("search_deadline_secs = {}\n", secs));
        }
        toml.push_str("\n[sources.apibay]\nenabled = false\n\n[resolver]\ntimeout_secs = 5\n");

        let config = load_config_from_str(&toml).expect("Invalid test config");

        let primary = Arc::new(MockSource::new("primary"));
        let secondary = Arc::new(MockSource::new("secondary"));
        let torrent_client = Arc::new(MockTorrentClient::new());

        let download_client = test_config
            .with_torrent_client
            .then(|| Arc::clone(&torrent_client) as Arc<dyn TorrentClient>);

        let resolver = LinkResolver::new(&config.resolver, &config.http.user_agent)
            .expect("Failed to build resolver");
        let aggregator = Aggregator::new(
            vec![
                Arc::clone(&primary) as Arc<dyn SourceClient>,
                Arc::clone(&secondary) as Arc<dyn SourceClient>,
            ],
            resolver,
            LivenessAnnotator::new(download_client.clone()),
            config.resolver.max_concurrent,
        );

        let authenticator: Arc<dyn Authenticator> = Arc::from(
            create_authenticator(&config.auth, &config.http)
                .expect("Failed to create authenticator"),
        );

        let state = Arc::new(AppState::new(
            config,
            authenticator,
            Arc::new(aggregator),
            download_client,
        ));

        let router = musicreq_server::api::create_router(state);

        Self {
            router,
            primary,
            secondary,
            torrent_client,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, None).await
    }

    /// Send a GET request with an Authorization header.
    pub async fn get_with_auth(&self, path: &str, authorization: &str) -> TestResponse {
        self.request("GET", path, None, Some(authorization)).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), None).await
    }

    /// Send a POST request with JSON body and an Authorization header.
    pub async fn post_with_auth(
        &self,
        path: &str,
        body: Value,
        authorization: &str,
    ) -> TestResponse {
        self.request("POST", path, Some(body), Some(authorization))
            .await
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        authorization: Option<&str>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        if let Some(value) = authorization {
            request_builder = request_builder.header("Authorization", value);
        }

        let request = match body {
            Some(json) => request_builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&json).unwrap()))
                .unwrap(),
            None => request_builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
