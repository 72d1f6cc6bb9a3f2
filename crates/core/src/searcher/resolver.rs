//! Magnet scraping for results that only link to a tracker page.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::redirect::Policy;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::metrics;

use super::{DecodeChain, NormalizedResult, SearchError, UnresolvedCandidate};

static MAGNET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"magnet:\?[^"'<>\s]+"#).unwrap());

/// First magnet URI in `text`, ending at a quote, angle bracket or whitespace.
///
/// HTML entities such as `&amp;` are left as they appear in the page.
pub fn extract_magnet(text: &str) -> Option<String> {
    MAGNET_PATTERN.find(text).map(|m| m.as_str().to_string())
}

/// Fetches tracker pages and pulls a magnet out of them.
pub struct LinkResolver {
    client: Client,
}

impl LinkResolver {
    pub fn new(config: &ResolverConfig, user_agent: &str) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .redirect(Policy::limited(10))
            .user_agent(user_agent)
            .build()
            .map_err(|e| SearchError::Configuration(e.to_string()))?;

        Ok(Self { client })
    }

    /// Find a magnet for `candidate`.
    ///
    /// Tries the primary page, then the fallback page when the primary
    /// fails or has no magnet. Never errors; `None` means "drop it".
    pub async fn resolve(&self, candidate: &UnresolvedCandidate) -> Option<String> {
        let chain = DecodeChain::for_legacy(candidate.legacy_encoding);

        match self.fetch_magnet(&candidate.primary, &chain).await {
            Ok(Some(magnet)) => {
                metrics::LINK_RESOLUTIONS.with_label_values(&["primary"]).inc();
                return Some(magnet);
            }
            Ok(None) => debug!(url = %candidate.primary, "No magnet on primary page"),
            Err(e) => debug!(url = %candidate.primary, error = %e, "Primary page fetch failed"),
        }

        let resolved = match candidate.fallback.as_deref() {
            Some(fallback) => match self.fetch_magnet(fallback, &chain).await {
                Ok(magnet) => magnet,
                Err(e) => {
                    debug!(url = %fallback, error = %e, "Fallback page fetch failed");
                    None
                }
            },
            None => None,
        };

        match resolved {
            Some(magnet) => {
                metrics::LINK_RESOLUTIONS.with_label_values(&["fallback"]).inc();
                Some(magnet)
            }
            None => {
                metrics::LINK_RESOLUTIONS.with_label_values(&["failed"]).inc();
                warn!(
                    title = %candidate.partial.title,
                    url = %candidate.primary,
                    "Could not resolve magnet, dropping result"
                );
                None
            }
        }
    }

    /// Resolve and complete the candidate's record.
    pub async fn resolve_candidate(&self, candidate: UnresolvedCandidate) -> Option<NormalizedResult> {
        let magnet = self.resolve(&candidate).await?;
        Some(candidate.partial.resolved(magnet))
    }

    async fn fetch_magnet(
        &self,
        url: &str,
        chain: &DecodeChain,
    ) -> Result<Option<String>, SearchError> {
        if !url.starts_with("http") {
            return Err(SearchError::ApiError(format!("Not an http URL: {}", url)));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(SearchError::from_transport)?;

        if !response.status().is_success() {
            return Err(SearchError::ApiError(format!("HTTP {}", response.status())));
        }

        let bytes = response.bytes().await.map_err(SearchError::from_transport)?;
        let (text, attempt) = chain.decode(&bytes);
        debug!(url = url, encoding = attempt.label(), "Decoded tracker page");

        Ok(extract_magnet(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1251;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HASH: &str = "dddddddddddddddddddddddddddddddddddddddd";

    fn resolver() -> LinkResolver {
        LinkResolver::new(
            &ResolverConfig {
                timeout_secs: 5,
                max_concurrent: 4,
            },
            "test",
        )
        .unwrap()
    }

    fn candidate(primary: &str, fallback: Option<&str>) -> UnresolvedCandidate {
        UnresolvedCandidate {
            partial: NormalizedResult::new("Редкий альбом", "").with_peers(7, 1),
            primary: primary.to_string(),
            fallback: fallback.map(str::to_string),
            legacy_encoding: WINDOWS_1251,
        }
    }

    fn page(magnet: &str) -> String {
        format!(
            r#"<html><body><a class="magnet-link" href="{}">Скачать</a></body></html>"#,
            magnet
        )
    }

    #[test]
    fn test_extract_magnet() {
        let html = format!(
            r#"<a href='magnet:?xt=urn:btih:{}&tr=http://bt.example/ann'>x</a>"#,
            HASH
        );
        assert_eq!(
            extract_magnet(&html),
            Some(format!("magnet:?xt=urn:btih:{}&tr=http://bt.example/ann", HASH))
        );
    }

    #[test]
    fn test_extract_magnet_stops_at_whitespace_and_brackets() {
        assert_eq!(
            extract_magnet("see magnet:?xt=urn:btih:abc then"),
            Some("magnet:?xt=urn:btih:abc".to_string())
        );
        assert_eq!(
            extract_magnet("<p>magnet:?xt=urn:btih:abc</p>"),
            Some("magnet:?xt=urn:btih:abc".to_string())
        );
    }

    #[test]
    fn test_extract_magnet_keeps_entities() {
        assert_eq!(
            extract_magnet(r#"href="magnet:?xt=urn:btih:abc&amp;dn=x""#),
            Some("magnet:?xt=urn:btih:abc&amp;dn=x".to_string())
        );
    }

    #[test]
    fn test_extract_magnet_first_match() {
        assert_eq!(
            extract_magnet("magnet:?a magnet:?b"),
            Some("magnet:?a".to_string())
        );
    }

    #[test]
    fn test_extract_magnet_none() {
        assert_eq!(extract_magnet("no links here"), None);
        assert_eq!(extract_magnet("magnet:? empty"), None);
    }

    #[tokio::test]
    async fn test_resolve_primary() {
        let server = MockServer::start().await;
        let magnet = format!("magnet:?xt=urn:btih:{}", HASH);
        Mock::given(method("GET"))
            .and(path("/forum/viewtopic.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page(&magnet)))
            .mount(&server)
            .await;

        let url = format!("{}/forum/viewtopic.php?t=1", server.uri());
        let resolved = resolver().resolve(&candidate(&url, None)).await;

        assert_eq!(resolved, Some(magnet));
    }

    #[tokio::test]
    async fn test_resolve_windows_1251_page() {
        let server = MockServer::start().await;
        let magnet = format!("magnet:?xt=urn:btih:{}", HASH);
        let html = page(&magnet);
        let (bytes, _, _) = WINDOWS_1251.encode(&html);
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(bytes.into_owned(), "text/html; charset=windows-1251"),
            )
            .mount(&server)
            .await;

        let resolved = resolver()
            .resolve(&candidate(&format!("{}/t/1", server.uri()), None))
            .await;

        assert_eq!(resolved, Some(magnet));
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_error() {
        let server = MockServer::start().await;
        let magnet = format!("magnet:?xt=urn:btih:{}", HASH);
        Mock::given(method("GET"))
            .and(path("/primary"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fallback"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page(&magnet)))
            .mount(&server)
            .await;

        let resolved = resolver()
            .resolve(&candidate(
                &format!("{}/primary", server.uri()),
                Some(&format!("{}/fallback", server.uri())),
            ))
            .await;

        assert_eq!(resolved, Some(magnet));
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_connection_refused() {
        let server = MockServer::start().await;
        let magnet = format!("magnet:?xt=urn:btih:{}", HASH);
        Mock::given(method("GET"))
            .and(path("/fallback"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page(&magnet)))
            .expect(1)
            .mount(&server)
            .await;

        let resolved = resolver()
            .resolve(&candidate(
                "http://127.0.0.1:1/forum/viewtopic.php?t=1",
                Some(&format!("{}/fallback", server.uri())),
            ))
            .await;

        assert_eq!(resolved, Some(magnet));
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_primary_timeout() {
        let server = MockServer::start().await;
        let magnet = format!("magnet:?xt=urn:btih:{}", HASH);
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(page("magnet:?xt=urn:btih:slow"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fallback"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page(&magnet)))
            .mount(&server)
            .await;

        let resolver = LinkResolver::new(
            &ResolverConfig {
                timeout_secs: 1,
                max_concurrent: 4,
            },
            "test",
        )
        .unwrap();
        let resolved = resolver
            .resolve(&candidate(
                &format!("{}/slow", server.uri()),
                Some(&format!("{}/fallback", server.uri())),
            ))
            .await;

        assert_eq!(resolved, Some(magnet));
    }

    #[tokio::test]
    async fn test_resolve_falls_back_when_primary_has_no_magnet() {
        let server = MockServer::start().await;
        let magnet = format!("magnet:?xt=urn:btih:{}", HASH);
        Mock::given(method("GET"))
            .and(path("/primary"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login required</html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fallback"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page(&magnet)))
            .mount(&server)
            .await;

        let resolved = resolver()
            .resolve(&candidate(
                &format!("{}/primary", server.uri()),
                Some(&format!("{}/fallback", server.uri())),
            ))
            .await;

        assert_eq!(resolved, Some(magnet));
    }

    #[tokio::test]
    async fn test_resolve_follows_redirects() {
        let server = MockServer::start().await;
        let magnet = format!("magnet:?xt=urn:btih:{}", HASH);
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", format!("{}/new", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page(&magnet)))
            .mount(&server)
            .await;

        let resolved = resolver()
            .resolve(&candidate(&format!("{}/old", server.uri()), None))
            .await;

        assert_eq!(resolved, Some(magnet));
    }

    #[tokio::test]
    async fn test_resolve_gives_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let resolved = resolver()
            .resolve(&candidate(
                &format!("{}/primary", server.uri()),
                Some(&format!("{}/fallback", server.uri())),
            ))
            .await;

        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_non_http_references_skipped() {
        let resolved = resolver()
            .resolve(&candidate("ftp://tracker.example/1", Some("/relative/download")))
            .await;

        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_resolve_candidate_completes_record() {
        let server = MockServer::start().await;
        let magnet = format!("magnet:?xt=urn:btih:{}", HASH);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page(&magnet)))
            .mount(&server)
            .await;

        let result = resolver()
            .resolve_candidate(candidate(&format!("{}/t", server.uri()), None))
            .await
            .unwrap();

        assert_eq!(result.download_ref, magnet);
        assert_eq!(result.content_id.as_deref(), Some(HASH));
        assert_eq!(result.title, "Редкий альбом");
        assert_eq!(result.seeders, 7);
    }
}
