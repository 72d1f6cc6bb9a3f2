//! Concurrent fan-out over all sources.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::metrics;
use crate::torrent_client::TorrentClient;

use super::dedup::merge_by_priority;
use super::{
    ApibayClient, LinkResolver, LivenessAnnotator, NormalizedResult, ProwlarrClient, SearchError,
    SearchStats, SourceBatch, SourceClient, SourceStats, UnresolvedCandidate,
};

/// Runs one query across every source and returns a single ordered list.
///
/// Source order is priority order: when two sources return the same info
/// hash, the earlier source's record is kept no matter which finished first.
pub struct Aggregator {
    sources: Vec<Arc<dyn SourceClient>>,
    resolver: Arc<LinkResolver>,
    annotator: LivenessAnnotator,
    max_concurrent_resolutions: usize,
}

impl Aggregator {
    pub fn new(
        sources: Vec<Arc<dyn SourceClient>>,
        resolver: LinkResolver,
        annotator: LivenessAnnotator,
        max_concurrent_resolutions: usize,
    ) -> Self {
        Self {
            sources,
            resolver: Arc::new(resolver),
            annotator,
            max_concurrent_resolutions: max_concurrent_resolutions.max(1),
        }
    }

    /// Build the configured sources (Apibay first, then Prowlarr).
    pub fn from_config(
        config: &Config,
        torrent_client: Option<Arc<dyn TorrentClient>>,
    ) -> Result<Self, SearchError> {
        let user_agent = config.http.user_agent.as_str();
        let mut sources: Vec<Arc<dyn SourceClient>> = Vec::new();

        if config.sources.apibay.enabled {
            sources.push(Arc::new(ApibayClient::new(
                config.sources.apibay.clone(),
                user_agent,
            )?));
        }
        if let Some(prowlarr) = config
            .sources
            .prowlarr
            .as_ref()
            .filter(|p| p.is_configured())
        {
            sources.push(Arc::new(ProwlarrClient::new(prowlarr.clone(), user_agent)?));
        }

        Ok(Self::new(
            sources,
            LinkResolver::new(&config.resolver, user_agent)?,
            LivenessAnnotator::new(torrent_client),
            config.resolver.max_concurrent,
        ))
    }

    /// Source names in priority order.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn search(&self, query: &str) -> Result<Vec<NormalizedResult>, SearchError> {
        let (results, _) = self.search_with_stats(query).await?;
        Ok(results)
    }

    /// Search every source and report per-stage counts.
    ///
    /// A failing source contributes nothing. The only error is an internal
    /// failure of the fan-out itself, e.g. a source task panicking.
    pub async fn search_with_stats(
        &self,
        query: &str,
    ) -> Result<(Vec<NormalizedResult>, SearchStats), SearchError> {
        let start = Instant::now();
        let (batches, sources) = self.query_sources(query).await?;

        // Candidates keep the index of the source that produced them so
        // resolved records merge back at that source's priority.
        let mut direct: Vec<Vec<NormalizedResult>> = Vec::with_capacity(batches.len());
        let mut candidates = Vec::new();
        for (index, batch) in batches.into_iter().enumerate() {
            direct.push(batch.results);
            candidates.extend(batch.unresolved.into_iter().map(|c| (index, c)));
        }

        let candidate_count = candidates.len();
        let resolved = self.resolve_all(candidates).await?;
        let resolved_count = resolved.iter().map(Vec::len).sum::<usize>();

        let lists = direct
            .into_iter()
            .zip(resolved)
            .map(|(mut direct, resolved)| {
                direct.extend(resolved);
                direct
            })
            .collect();
        let (merged, duplicates_dropped) = merge_by_priority(lists);
        metrics::DUPLICATES_DROPPED.inc_by(duplicates_dropped as u64);

        let results = self.annotator.annotate(merged).await;

        let stats = SearchStats {
            sources,
            resolved: resolved_count,
            unresolved_dropped: candidate_count - resolved_count,
            duplicates_dropped,
            returned: results.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        metrics::SEARCH_RESULTS.observe(results.len() as f64);
        info!(
            query = query,
            results = stats.returned,
            resolved = stats.resolved,
            unresolved_dropped = stats.unresolved_dropped,
            duplicates_dropped = stats.duplicates_dropped,
            duration_ms = stats.duration_ms,
            "Search complete"
        );

        Ok((results, stats))
    }

    /// Query all sources concurrently; batches come back in source order.
    async fn query_sources(
        &self,
        query: &str,
    ) -> Result<(Vec<SourceBatch>, Vec<SourceStats>), SearchError> {
        let handles: Vec<_> = self
            .sources
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                let query = query.to_string();
                tokio::spawn(async move {
                    let start = Instant::now();
                    let result = source.search(&query).await;
                    (result, start.elapsed())
                })
            })
            .collect();

        let outcomes = futures::future::join_all(handles).await;

        let mut batches = Vec::with_capacity(outcomes.len());
        let mut stats = Vec::with_capacity(outcomes.len());
        for (source, outcome) in self.sources.iter().zip(outcomes) {
            let name = source.name();
            let (result, elapsed) = outcome.map_err(|e| {
                error!(source = name, error = %e, "Source task failed");
                SearchError::Internal(format!("source '{}' task failed: {}", name, e))
            })?;

            metrics::SOURCE_DURATION
                .with_label_values(&[name])
                .observe(elapsed.as_secs_f64());

            let (batch, error) = match result {
                Ok(batch) => {
                    metrics::SOURCE_QUERIES
                        .with_label_values(&[name, "success"])
                        .inc();
                    (batch, None)
                }
                Err(e) => {
                    metrics::SOURCE_QUERIES
                        .with_label_values(&[name, "failed"])
                        .inc();
                    warn!(source = name, error = %e, "Source search failed, skipping");
                    (SourceBatch::default(), Some(e.to_string()))
                }
            };

            stats.push(SourceStats {
                name: name.to_string(),
                direct: batch.results.len(),
                unresolved: batch.unresolved.len(),
                error,
                duration_ms: elapsed.as_millis() as u64,
            });
            batches.push(batch);
        }

        Ok((batches, stats))
    }

    /// Resolve candidates with bounded concurrency, grouped per source in
    /// their original order.
    async fn resolve_all(
        &self,
        candidates: Vec<(usize, UnresolvedCandidate)>,
    ) -> Result<Vec<Vec<NormalizedResult>>, SearchError> {
        let mut resolved: Vec<Vec<NormalizedResult>> = vec![Vec::new(); self.sources.len()];

        let outcomes: Vec<_> = stream::iter(candidates)
            .map(|(index, candidate)| {
                let resolver = Arc::clone(&self.resolver);
                async move {
                    let outcome =
                        tokio::spawn(async move { resolver.resolve_candidate(candidate).await })
                            .await;
                    (index, outcome)
                }
            })
            .buffered(self.max_concurrent_resolutions)
            .collect()
            .await;

        for (index, outcome) in outcomes {
            let result = outcome.map_err(|e| {
                error!(error = %e, "Link resolution task failed");
                SearchError::Internal(format!("link resolution task failed: {}", e))
            })?;
            if let Some(result) = result {
                resolved[index].push(result);
            }
        }

        Ok(resolved)
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("sources", &self.source_names())
            .field("annotator", &self.annotator)
            .field("max_concurrent_resolutions", &self.max_concurrent_resolutions)
            .finish()
    }
}
