//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Sources (queries, latency)
//! - Link resolution and deduplication
//! - Download client lookups

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Sources
// =============================================================================

/// Source queries total by source and result.
pub static SOURCE_QUERIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("musicreq_source_queries_total", "Total source queries"),
        &["source", "result"], // result: "success", "failed"
    )
    .unwrap()
});

/// Source query duration in seconds.
pub static SOURCE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "musicreq_source_duration_seconds",
            "Duration of a single source query",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["source"],
    )
    .unwrap()
});

// =============================================================================
// Aggregation
// =============================================================================

/// Link resolutions by outcome.
pub static LINK_RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "musicreq_link_resolutions_total",
            "Tracker page magnet resolutions",
        ),
        &["outcome"], // "primary", "fallback", "failed"
    )
    .unwrap()
});

/// Results dropped as duplicates of a higher-priority result.
pub static DUPLICATES_DROPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "musicreq_duplicates_dropped_total",
        "Results dropped because an earlier result had the same info hash",
    )
    .unwrap()
});

/// Results returned per search.
pub static SEARCH_RESULTS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("musicreq_search_results", "Results returned per search")
            .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
    )
    .unwrap()
});

// =============================================================================
// Download client
// =============================================================================

/// Failed download client lookups during annotation.
pub static ANNOTATION_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "musicreq_annotation_failures_total",
        "Download client lookups that failed while annotating results",
    )
    .unwrap()
});

/// Magnets handed to the download client, by result.
pub static TORRENTS_ADDED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "musicreq_torrents_added_total",
            "Magnets submitted to the download client",
        ),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SOURCE_QUERIES.clone()),
        Box::new(SOURCE_DURATION.clone()),
        Box::new(LINK_RESOLUTIONS.clone()),
        Box::new(DUPLICATES_DROPPED.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        Box::new(ANNOTATION_FAILURES.clone()),
        Box::new(TORRENTS_ADDED.clone()),
    ]
}
