//! Perfume domain events consumed by the search indexing pipeline.
//!
//! Events are emitted by the relational write path after its transaction
//! commits and travel over a Redis stream with at-least-once semantics.
//! Delivery may be duplicated or reordered; convergence comes from the
//! idempotent upsert/delete writes plus the periodic reconciling reindex,
//! never from sequencing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Redis stream carrying perfume change events
pub const PERFUME_EVENTS_STREAM: &str = "perfumes:events";
/// Consumer group of search indexers
pub const PERFUME_EVENTS_GROUP: &str = "search_indexers";
/// Dead letter queue for events that exhausted retries
pub const PERFUME_EVENTS_DLQ: &str = "perfumes:events:dlq";
/// Approximate stream trim length
pub const PERFUME_EVENTS_MAX_LENGTH: i64 = 100_000;

/// What happened to the perfume
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PerfumeEventKind {
    Created,
    Updated,
    Deleted,
}

/// A perfume change event keyed by perfume id.
///
/// `retry_count` travels with the payload so a requeued event keeps its
/// history across consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfumeEvent {
    /// Unique event id (stable across retries)
    pub event_id: Uuid,
    pub perfume_id: Uuid,
    pub kind: PerfumeEventKind,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub retry_count: u32,
}

impl PerfumeEvent {
    pub const MAX_RETRIES: u32 = 3;

    pub fn new(kind: PerfumeEventKind, perfume_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            perfume_id,
            kind,
            occurred_at: Utc::now(),
            retry_count: 0,
        }
    }

    pub fn created(perfume_id: Uuid) -> Self {
        Self::new(PerfumeEventKind::Created, perfume_id)
    }

    pub fn updated(perfume_id: Uuid) -> Self {
        Self::new(PerfumeEventKind::Updated, perfume_id)
    }

    pub fn deleted(perfume_id: Uuid) -> Self {
        Self::new(PerfumeEventKind::Deleted, perfume_id)
    }

    /// Copy of this event with an incremented retry count (same event id)
    pub fn with_retry(&self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self.clone()
        }
    }

    pub fn exceeded_max_retries(&self) -> bool {
        self.retry_count >= Self::MAX_RETRIES
    }
}
