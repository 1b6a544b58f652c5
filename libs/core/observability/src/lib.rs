//! Observability utilities for the perfume search platform.
//!
//! This crate provides:
//! - Prometheus metrics recording and export
//! - Custom metrics for indexing, search, and event sync operations
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, IndexingMetrics};
//!
//! // Initialize metrics recorder
//! init_metrics();
//!
//! // Record indexing operations
//! IndexingMetrics::record_document_indexed();
//!
//! // Add metrics endpoint to router
//! let app = Router::new()
//!     .route("/metrics", get(metrics_handler));
//! ```

pub mod indexing;

pub use indexing::{IndexingMetrics, SearchMetrics};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// This should be called once at application startup.
/// Returns the PrometheusHandle for rendering metrics.
pub fn init_metrics() -> &'static PrometheusHandle {
    METRICS_HANDLE.get_or_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("Failed to install Prometheus recorder");

        info!("Prometheus metrics recorder initialized");

        register_metric_descriptions();

        handle
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

/// Register metric descriptions for documentation
fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // Indexing metrics
    describe_counter!(
        "indexing_documents_total",
        "Documents written to the search store by operation (upsert/delete)"
    );
    describe_counter!(
        "indexing_failures_total",
        "Indexing failures by error kind"
    );
    describe_histogram!(
        "indexing_reindex_duration_seconds",
        "Full catalog reindex duration in seconds"
    );
    describe_gauge!(
        "indexing_reindex_last_indexed",
        "Documents written during the last full reindex"
    );
    describe_gauge!(
        "indexing_reindex_last_skipped",
        "Documents skipped during the last full reindex"
    );

    // Search metrics
    describe_counter!(
        "search_queries_total",
        "Search queries by kind (search/similar/recommend)"
    );
    describe_histogram!(
        "search_query_duration_seconds",
        "Search query duration in seconds"
    );

    // Event sync metrics
    describe_counter!(
        "sync_events_total",
        "Perfume events processed by outcome (success/retried/dropped)"
    );
    describe_counter!(
        "sync_events_dlq_total",
        "Perfume events moved to the dead letter queue"
    );

    // Preference analysis metrics
    describe_counter!(
        "preference_vectors_recomputed_total",
        "Member preference vectors recomputed"
    );
}
