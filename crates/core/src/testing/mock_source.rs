//! Mock search source for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::searcher::{
    NormalizedResult, SearchError, SourceBatch, SourceClient, UnresolvedCandidate,
};

/// Mock implementation of the SourceClient trait.
///
/// Provides controllable behavior for testing:
/// - Return a configurable batch
/// - Track queries for assertions
/// - Simulate failures, slow responses and task panics
///
/// # Example
///
/// ```rust,ignore
/// use musicreq_core::testing::{fixtures, MockSource};
///
/// let source = MockSource::new("apibay");
/// source.set_results(vec![fixtures::result("Discovery", &fixtures::info_hash(1))]).await;
/// source.set_delay(Duration::from_millis(50)).await;
///
/// let batch = source.search("daft punk").await?;
/// assert_eq!(source.recorded_queries().await, vec!["daft punk"]);
/// ```
#[derive(Debug)]
pub struct MockSource {
    name: String,
    batch: Arc<RwLock<SourceBatch>>,
    queries: Arc<RwLock<Vec<String>>>,
    /// If set, every search fails with a clone of this message.
    failure: Arc<RwLock<Option<String>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    panics: Arc<RwLock<bool>>,
}

impl MockSource {
    /// Create a mock source that returns nothing.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batch: Arc::new(RwLock::new(SourceBatch::default())),
            queries: Arc::new(RwLock::new(Vec::new())),
            failure: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
            panics: Arc::new(RwLock::new(false)),
        }
    }

    /// Set the direct results returned by subsequent searches.
    pub async fn set_results(&self, results: Vec<NormalizedResult>) {
        self.batch.write().await.results = results;
    }

    /// Set the candidates needing link resolution.
    pub async fn set_unresolved(&self, unresolved: Vec<UnresolvedCandidate>) {
        self.batch.write().await.unresolved = unresolved;
    }

    /// Make every search fail with an API error.
    pub async fn set_failure(&self, message: impl Into<String>) {
        *self.failure.write().await = Some(message.into());
    }

    /// Delay every search by `delay` before answering.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Make the search task panic.
    pub async fn set_panics(&self, panics: bool) {
        *self.panics.write().await = panics;
    }

    /// Queries searched so far, in order.
    pub async fn recorded_queries(&self) -> Vec<String> {
        self.queries.read().await.clone()
    }
}

#[async_trait]
impl SourceClient for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str) -> Result<SourceBatch, SearchError> {
        self.queries.write().await.push(query.to_string());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.panics.read().await {
            panic!("mock source {} panicked", self.name);
        }

        if let Some(message) = self.failure.read().await.clone() {
            return Err(SearchError::ApiError(message));
        }

        Ok(self.batch.read().await.clone())
    }
}
