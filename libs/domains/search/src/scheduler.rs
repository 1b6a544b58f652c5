//! Scheduled reconciliation tasks.
//!
//! Two independent cron jobs back up the event-driven path:
//! - a daily full reindex heals anything missed, duplicated, or reordered
//!   events left behind,
//! - a weekly preference recomputation refreshes the vectors consumed by
//!   recommendation queries.
//!
//! Both are fire-and-forget and safe to run concurrently with the event
//! worker: every write is an idempotent full replace, so no coordination is
//! needed or wanted.

use domain_catalog::CatalogReadRepository;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::analysis::PreferenceAnalysisService;
use crate::error::{SearchError, SearchResult};
use crate::indexer::IndexingService;
use crate::preferences::PreferenceRepository;
use crate::repository::SearchRepository;

/// Cron expressions for the two reconciliation jobs (six-field format with
/// seconds, as consumed by tokio-cron-scheduler).
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Daily full reindex; default 03:00
    pub reindex_cron: String,
    /// Weekly preference recomputation; default Monday 04:00
    pub preferences_cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            reindex_cron: "0 0 3 * * *".to_string(),
            preferences_cron: "0 0 4 * * Mon".to_string(),
        }
    }
}

/// Owns the cron scheduler for the indexing safety nets.
pub struct IndexingScheduler {
    scheduler: JobScheduler,
}

impl IndexingScheduler {
    /// Register both jobs and start the scheduler.
    ///
    /// The returned handle must be kept alive for jobs to keep firing.
    pub async fn start<C, S, P>(
        config: ScheduleConfig,
        indexing: IndexingService<C, S>,
        analysis: PreferenceAnalysisService<C, P>,
    ) -> SearchResult<Self>
    where
        C: CatalogReadRepository + 'static,
        S: SearchRepository + 'static,
        P: PreferenceRepository + 'static,
    {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| SearchError::Internal(e.to_string()))?;

        let reindex_job = Job::new_async(config.reindex_cron.as_str(), move |_uuid, _lock| {
            let indexing = indexing.clone();

            Box::pin(async move {
                info!("Running scheduled full reindex");
                match indexing.reindex_all().await {
                    Ok(report) => info!(
                        indexed = report.indexed,
                        skipped = report.skipped,
                        "Scheduled reindex complete"
                    ),
                    Err(e) => error!(error = %e, "Scheduled reindex failed"),
                }
            })
        })
        .map_err(|e| SearchError::Internal(e.to_string()))?;

        let preferences_job =
            Job::new_async(config.preferences_cron.as_str(), move |_uuid, _lock| {
                let analysis = analysis.clone();

                Box::pin(async move {
                    info!("Running scheduled preference recomputation");
                    match analysis.recompute_all().await {
                        Ok(report) => info!(
                            computed = report.computed,
                            skipped = report.skipped,
                            "Scheduled preference recomputation complete"
                        ),
                        Err(e) => error!(error = %e, "Scheduled preference recomputation failed"),
                    }
                })
            })
            .map_err(|e| SearchError::Internal(e.to_string()))?;

        scheduler
            .add(reindex_job)
            .await
            .map_err(|e| SearchError::Internal(e.to_string()))?;
        scheduler
            .add(preferences_job)
            .await
            .map_err(|e| SearchError::Internal(e.to_string()))?;

        scheduler
            .start()
            .await
            .map_err(|e| SearchError::Internal(e.to_string()))?;

        info!(
            reindex_cron = %config.reindex_cron,
            preferences_cron = %config.preferences_cron,
            "Indexing scheduler started"
        );

        Ok(Self { scheduler })
    }

    /// Stop firing jobs. In-flight runs finish on their own tasks.
    pub async fn shutdown(mut self) -> SearchResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| SearchError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_is_daily_and_weekly() {
        let config = ScheduleConfig::default();
        assert_eq!(config.reindex_cron, "0 0 3 * * *");
        assert_eq!(config.preferences_cron, "0 0 4 * * Mon");
    }
}
