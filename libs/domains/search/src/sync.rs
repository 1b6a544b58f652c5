//! Event-driven synchronization of the search store.
//!
//! Consumes [`PerfumeEvent`]s from a Redis stream with a consumer group and
//! applies them through the [`IndexingService`]. Delivery is at-least-once,
//! possibly duplicated and possibly reordered; correctness rests on the
//! idempotent full-replace writes plus the scheduled reconciling reindex,
//! so no sequencing or locking happens here.
//!
//! Failure policy per event:
//! - transient errors (store unavailable) requeue the event with bounded
//!   exponential backoff, up to [`PerfumeEvent::MAX_RETRIES`],
//! - permanent errors (bad mapping input) go straight to the DLQ,
//! - a missing relational source acks as success; the compensating delete
//!   already converged the store.
//!
//! Each event runs on its own task; one event's failure never blocks its
//! siblings.

use std::time::Duration;

use domain_catalog::CatalogReadRepository;
use observability::IndexingMetrics;
use redis::aio::ConnectionManager;
use redis::RedisResult;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{SearchError, SearchResult};
use crate::events::{
    PerfumeEvent, PerfumeEventKind, PERFUME_EVENTS_DLQ, PERFUME_EVENTS_GROUP,
    PERFUME_EVENTS_MAX_LENGTH, PERFUME_EVENTS_STREAM,
};
use crate::indexer::IndexingService;
use crate::repository::SearchRepository;

/// Base delay for the exponential retry backoff
const BACKOFF_BASE_MS: u64 = 1_000;
/// Upper bound on any single retry delay
const BACKOFF_CAP_MS: u64 = 30_000;

/// Bounded exponential backoff: 1s, 2s, 4s, ... capped at 30s.
pub fn backoff_delay(retry_count: u32) -> Duration {
    let delay = BACKOFF_BASE_MS.saturating_mul(2u64.saturating_pow(retry_count));
    Duration::from_millis(delay.min(BACKOFF_CAP_MS))
}

/// Configuration for the event sync worker
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub stream_name: String,
    pub consumer_group: String,
    /// Unique per-process consumer id
    pub consumer_id: String,
    pub dlq_stream: String,
    /// Maximum events fetched per read
    pub batch_size: usize,
    /// XREADGROUP BLOCK timeout
    pub block_timeout_ms: u64,
    /// Idle time before another consumer's pending message is claimed
    pub claim_idle_ms: u64,
    pub max_length: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            stream_name: PERFUME_EVENTS_STREAM.to_string(),
            consumer_group: PERFUME_EVENTS_GROUP.to_string(),
            consumer_id: format!("indexer-{}", Uuid::new_v4()),
            dlq_stream: PERFUME_EVENTS_DLQ.to_string(),
            batch_size: 16,
            block_timeout_ms: 5_000,
            claim_idle_ms: 60_000,
            max_length: PERFUME_EVENTS_MAX_LENGTH,
        }
    }
}

/// Publisher for perfume events (used by the relational write path and by
/// operational tooling to replay events).
#[derive(Clone)]
pub struct PerfumeEventPublisher {
    redis: ConnectionManager,
    stream_name: String,
    max_length: i64,
}

impl PerfumeEventPublisher {
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            redis,
            stream_name: PERFUME_EVENTS_STREAM.to_string(),
            max_length: PERFUME_EVENTS_MAX_LENGTH,
        }
    }

    /// Enqueue an event. Returns the Redis stream entry id.
    pub async fn publish(&self, event: &PerfumeEvent) -> SearchResult<String> {
        let mut conn = self.redis.clone();
        let payload = serde_json::to_string(event)
            .map_err(|e| SearchError::Internal(e.to_string()))?;

        // MAXLEN ~ trims approximately, which is cheaper than exact trims
        let stream_id: String = redis::cmd("XADD")
            .arg(&self.stream_name)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.max_length)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .query_async(&mut conn)
            .await?;

        debug!(
            stream = %self.stream_name,
            stream_id = %stream_id,
            perfume_id = %event.perfume_id,
            kind = %event.kind,
            "Published perfume event"
        );

        Ok(stream_id)
    }
}

type StreamReadReply = Vec<(String, Vec<(String, Vec<(String, String)>)>)>;

/// Decode XREADGROUP replies into events, skipping entries that cannot be
/// parsed (they are logged, not retried; garbage never heals).
fn parse_entries(streams: StreamReadReply) -> Vec<(String, PerfumeEvent)> {
    let mut events = Vec::new();

    for (_stream, entries) in streams {
        for (stream_id, fields) in entries {
            let payload = fields
                .iter()
                .find(|(key, _)| key == "job")
                .map(|(_, value)| value.as_str());

            match payload {
                Some(json) => match serde_json::from_str::<PerfumeEvent>(json) {
                    Ok(event) => events.push((stream_id, event)),
                    Err(e) => {
                        warn!(stream_id = %stream_id, error = %e, "Skipping unparseable event");
                    }
                },
                None => {
                    warn!(stream_id = %stream_id, "Skipping entry without a job field");
                }
            }
        }
    }

    events
}

/// Worker that drains the perfume event stream into the search store.
pub struct PerfumeEventWorker<C, S> {
    redis: ConnectionManager,
    indexing: IndexingService<C, S>,
    config: SyncConfig,
}

impl<C, S> PerfumeEventWorker<C, S>
where
    C: CatalogReadRepository + 'static,
    S: SearchRepository + 'static,
{
    pub fn new(redis: ConnectionManager, indexing: IndexingService<C, S>, config: SyncConfig) -> Self {
        Self {
            redis,
            indexing,
            config,
        }
    }

    /// Create the consumer group if it does not exist yet.
    pub async fn ensure_consumer_group(&self) -> SearchResult<()> {
        let mut conn = self.redis.clone();

        let result: RedisResult<()> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(()) => {
                info!(
                    stream = %self.config.stream_name,
                    group = %self.config.consumer_group,
                    "Created consumer group"
                );
                Ok(())
            }
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!(group = %self.config.consumer_group, "Consumer group already exists");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run the consumer loop until the shutdown signal flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> SearchResult<()> {
        info!(
            stream = %self.config.stream_name,
            group = %self.config.consumer_group,
            consumer = %self.config.consumer_id,
            "Starting perfume event worker"
        );

        self.ensure_consumer_group().await?;

        let claim_interval = Duration::from_millis(self.config.claim_idle_ms);
        let mut last_claim = std::time::Instant::now();
        let mut consecutive_errors = 0u32;

        loop {
            if *shutdown.borrow() {
                info!("Received shutdown signal, stopping event worker");
                break;
            }

            match self.process_batch().await {
                Ok(_) => {
                    if consecutive_errors > 0 {
                        info!(
                            errors = consecutive_errors,
                            "Event stream connection recovered"
                        );
                        consecutive_errors = 0;
                    }
                }
                Err(e) => {
                    consecutive_errors += 1;
                    let delay = backoff_delay(consecutive_errors.min(5));
                    warn!(
                        error = %e,
                        consecutive_errors = consecutive_errors,
                        delay_ms = delay.as_millis() as u64,
                        "Event stream read failed, backing off"
                    );

                    tokio::select! {
                        _ = shutdown.changed() => {}
                        _ = tokio::time::sleep(delay) => {}
                    }
                    continue;
                }
            }

            if last_claim.elapsed() >= claim_interval {
                if let Err(e) = self.claim_abandoned().await {
                    debug!(error = %e, "Failed to claim abandoned events");
                }
                last_claim = std::time::Instant::now();
            }
        }

        info!("Perfume event worker stopped");
        Ok(())
    }

    /// Read one batch (pending first, then new) and process every event on
    /// its own task.
    async fn process_batch(&self) -> SearchResult<usize> {
        let mut entries = self.read_entries("0", false).await?;
        entries.extend(self.read_entries(">", true).await?);

        if entries.is_empty() {
            return Ok(0);
        }

        let count = entries.len();
        let mut join_set: JoinSet<()> = JoinSet::new();

        for (stream_id, event) in entries {
            let redis = self.redis.clone();
            let config = self.config.clone();
            let indexing = self.indexing.clone();

            join_set.spawn(async move {
                Self::handle_entry(redis, config, indexing, stream_id, event).await;
            });
        }

        while join_set.join_next().await.is_some() {}

        Ok(count)
    }

    /// Apply one event and settle it (ack / requeue / DLQ).
    async fn handle_entry(
        redis: ConnectionManager,
        config: SyncConfig,
        indexing: IndexingService<C, S>,
        stream_id: String,
        event: PerfumeEvent,
    ) {
        debug!(
            stream_id = %stream_id,
            event_id = %event.event_id,
            kind = %event.kind,
            retry_count = event.retry_count,
            "Processing perfume event"
        );

        let outcome = Self::apply(&indexing, &event).await;

        match outcome {
            Ok(()) => {
                IndexingMetrics::record_sync_event("success");
            }
            // The source row is gone and the stale document was already
            // removed, so the store converged and there is nothing to retry.
            Err(SearchError::NotFound(_)) => {
                IndexingMetrics::record_sync_event("converged");
            }
            Err(e) if e.is_transient() && !event.exceeded_max_retries() => {
                let delay = backoff_delay(event.retry_count);
                warn!(
                    event_id = %event.event_id,
                    retry_count = event.retry_count,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient failure, requeueing event with backoff"
                );

                tokio::time::sleep(delay).await;

                if let Err(requeue_err) =
                    Self::requeue(&redis, &config, &event.with_retry()).await
                {
                    error!(error = %requeue_err, "Failed to requeue event");
                }
                IndexingMetrics::record_sync_event("retried");
            }
            Err(e) => {
                warn!(
                    event_id = %event.event_id,
                    error = %e,
                    retry_count = event.retry_count,
                    "Dropping event to DLQ"
                );

                if let Err(dlq_err) = Self::move_to_dlq(&redis, &config, &event, &e).await {
                    error!(error = %dlq_err, "Failed to write event to DLQ");
                }
                IndexingMetrics::record_sync_event("dropped");
                IndexingMetrics::record_sync_dlq();
            }
        }

        // Always ack the original entry; unsettled work was requeued above.
        if let Err(e) = Self::ack(&redis, &config, &stream_id).await {
            error!(stream_id = %stream_id, error = %e, "Failed to ACK event");
        }
    }

    /// Route the event into the indexing service.
    async fn apply(indexing: &IndexingService<C, S>, event: &PerfumeEvent) -> SearchResult<()> {
        match event.kind {
            PerfumeEventKind::Created | PerfumeEventKind::Updated => {
                indexing.index_perfume(event.perfume_id).await
            }
            PerfumeEventKind::Deleted => {
                indexing.delete_perfume(event.perfume_id).await?;
                Ok(())
            }
        }
    }

    async fn read_entries(
        &self,
        start: &str,
        block: bool,
    ) -> SearchResult<Vec<(String, PerfumeEvent)>> {
        let mut conn = self.redis.clone();

        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(&self.config.consumer_id);

        if block {
            cmd.arg("BLOCK").arg(self.config.block_timeout_ms);
        }

        cmd.arg("COUNT")
            .arg(self.config.batch_size)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(start);

        let reply: RedisResult<Option<StreamReadReply>> = cmd.query_async(&mut conn).await;

        match reply {
            Ok(Some(streams)) => Ok(parse_entries(streams)),
            Ok(None) => Ok(vec![]),
            Err(e) if e.to_string().contains("NOGROUP") => {
                self.ensure_consumer_group().await?;
                Ok(vec![])
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Claim events another consumer picked up and then abandoned.
    async fn claim_abandoned(&self) -> SearchResult<()> {
        let mut conn = self.redis.clone();

        let pending: RedisResult<Vec<(String, String, i64, i64)>> = redis::cmd("XPENDING")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("-")
            .arg("+")
            .arg(self.config.batch_size)
            .query_async(&mut conn)
            .await;

        let pending = match pending {
            Ok(p) => p,
            Err(e) if e.to_string().contains("NOGROUP") => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let stale: Vec<String> = pending
            .into_iter()
            .filter(|(_, _, idle_ms, _)| *idle_ms > self.config.claim_idle_ms as i64)
            .map(|(id, _, _, _)| id)
            .collect();

        if stale.is_empty() {
            return Ok(());
        }

        let mut cmd = redis::cmd("XCLAIM");
        cmd.arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(&self.config.consumer_id)
            .arg(self.config.claim_idle_ms);
        for id in &stale {
            cmd.arg(id);
        }

        let claimed: Vec<(String, Vec<(String, String)>)> = cmd.query_async(&mut conn).await?;
        if !claimed.is_empty() {
            warn!(count = claimed.len(), "Claimed abandoned events");
        }

        Ok(())
    }

    async fn ack(
        redis: &ConnectionManager,
        config: &SyncConfig,
        stream_id: &str,
    ) -> SearchResult<()> {
        let mut conn = redis.clone();
        let _: i64 = redis::cmd("XACK")
            .arg(&config.stream_name)
            .arg(&config.consumer_group)
            .arg(stream_id)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn requeue(
        redis: &ConnectionManager,
        config: &SyncConfig,
        event: &PerfumeEvent,
    ) -> SearchResult<()> {
        let mut conn = redis.clone();
        let payload = serde_json::to_string(event)
            .map_err(|e| SearchError::Internal(e.to_string()))?;

        let _: String = redis::cmd("XADD")
            .arg(&config.stream_name)
            .arg("MAXLEN")
            .arg("~")
            .arg(config.max_length)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    async fn move_to_dlq(
        redis: &ConnectionManager,
        config: &SyncConfig,
        event: &PerfumeEvent,
        error: &SearchError,
    ) -> SearchResult<()> {
        let mut conn = redis.clone();
        let payload = serde_json::to_string(event)
            .map_err(|e| SearchError::Internal(e.to_string()))?;

        let _: String = redis::cmd("XADD")
            .arg(&config.dlq_stream)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("error")
            .arg(error.to_string())
            .query_async(&mut conn)
            .await?;

        Ok(())
    }
}
