//! Indexing and search specific metric recorders.

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Indexing pipeline metrics recorder
pub struct IndexingMetrics;

impl IndexingMetrics {
    /// Record a document upsert into the search store
    pub fn record_document_indexed() {
        counter!("indexing_documents_total", "operation" => "upsert").increment(1);
    }

    /// Record a document removal from the search store
    pub fn record_document_deleted() {
        counter!("indexing_documents_total", "operation" => "delete").increment(1);
    }

    /// Record an indexing failure by error kind
    pub fn record_failure(kind: &str) {
        counter!("indexing_failures_total", "kind" => kind.to_string()).increment(1);
    }

    /// Record the outcome of a full catalog reindex
    pub fn record_reindex(indexed: usize, skipped: usize, duration: Duration) {
        histogram!("indexing_reindex_duration_seconds").record(duration.as_secs_f64());
        gauge!("indexing_reindex_last_indexed").set(indexed as f64);
        gauge!("indexing_reindex_last_skipped").set(skipped as f64);

        tracing::debug!(
            indexed = indexed,
            skipped = skipped,
            duration_ms = duration.as_millis() as u64,
            "Recorded reindex metrics"
        );
    }

    /// Record an event processed by the sync worker
    pub fn record_sync_event(outcome: &str) {
        counter!("sync_events_total", "outcome" => outcome.to_string()).increment(1);
    }

    /// Record an event moved to the dead letter queue
    pub fn record_sync_dlq() {
        counter!("sync_events_dlq_total").increment(1);
    }

    /// Record a recomputed member preference vector
    pub fn record_preference_recomputed() {
        counter!("preference_vectors_recomputed_total").increment(1);
    }
}

/// Search query metrics recorder
pub struct SearchMetrics;

impl SearchMetrics {
    /// Record a query execution with its duration
    pub fn record_query(kind: &str, duration: Duration) {
        counter!("search_queries_total", "kind" => kind.to_string()).increment(1);
        histogram!("search_query_duration_seconds", "kind" => kind.to_string())
            .record(duration.as_secs_f64());
    }
}
