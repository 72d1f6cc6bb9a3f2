//! Credential check against a Subsonic-compatible media server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::SubsonicConfig;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Authenticator that forwards HTTP Basic credentials to `/rest/ping.view`.
///
/// The media server is the source of truth for users; nothing is cached, so
/// a password change on the server takes effect immediately.
pub struct SubsonicAuthenticator {
    client: Client,
    config: SubsonicConfig,
}

impl SubsonicAuthenticator {
    pub fn new(config: SubsonicConfig, user_agent: &str) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(user_agent)
            .build()
            .map_err(|e| AuthError::ConfigurationError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Ask the media server whether `username`/`password` are valid.
    pub async fn verify(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        let url = format!("{}/rest/ping.view", self.config.url.trim_end_matches('/'));
        let params = [
            ("u", username),
            ("p", password),
            ("v", self.config.api_version.as_str()),
            ("c", self.config.client_name.as_str()),
        ];

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| AuthError::ServiceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "Subsonic ping rejected");
            return Ok(false);
        }

        let body = response
            .text()
            .await
            .map_err(|e| AuthError::ServiceUnavailable(e.to_string()))?;

        Ok(ping_succeeded(&body))
    }
}

/// Subsonic answers in XML or JSON depending on the `f` parameter.
fn ping_succeeded(body: &str) -> bool {
    body.contains("status=\"ok\"") || body.contains("\"status\":\"ok\"")
}

#[async_trait]
impl Authenticator for SubsonicAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let (username, password) = request
            .basic_credentials()
            .ok_or(AuthError::NotAuthenticated)?;

        match self.verify(&username, &password).await {
            Ok(true) => Ok(Identity {
                user_id: username,
                method: "subsonic".to_string(),
            }),
            Ok(false) => Err(AuthError::InvalidCredentials(
                "Invalid media server credentials".to_string(),
            )),
            Err(e) => {
                warn!(error = %e, "Subsonic credential check failed");
                Err(e)
            }
        }
    }

    fn method_name(&self) -> &'static str {
        "subsonic"
    }
}
