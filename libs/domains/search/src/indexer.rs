use std::sync::Arc;
use std::time::Instant;

use domain_catalog::CatalogReadRepository;
use observability::IndexingMetrics;
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{SearchError, SearchResult};
use crate::mapper;
use crate::repository::SearchRepository;

/// Outcome of a full catalog reindex
#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
pub struct ReindexReport {
    pub indexed: usize,
    pub skipped: usize,
}

/// Orchestrates document writes against the search store.
///
/// All operations are idempotent: an upsert fully replaces the document and
/// a delete of an absent id is a no-op. Retrying any of them converges to
/// the same store state, which is what the event-driven sync layer relies
/// on. No retries happen here; transient failures surface to the caller.
pub struct IndexingService<C, S> {
    catalog: Arc<C>,
    store: Arc<S>,
    batch_size: u64,
}

impl<C, S> Clone for IndexingService<C, S> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            store: Arc::clone(&self.store),
            batch_size: self.batch_size,
        }
    }
}

impl<C, S> IndexingService<C, S>
where
    C: CatalogReadRepository,
    S: SearchRepository,
{
    pub const DEFAULT_BATCH_SIZE: u64 = 200;

    pub fn new(catalog: Arc<C>, store: Arc<S>) -> Self {
        Self {
            catalog,
            store,
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Project one perfume into the store.
    ///
    /// When the relational source no longer has the id, any stale document
    /// is deleted before `NotFound` is returned: "not found" during an
    /// index request is evidence of a deletion, not a pass-through error.
    #[instrument(skip(self), fields(perfume_id = %id))]
    pub async fn index_perfume(&self, id: Uuid) -> SearchResult<()> {
        match self.catalog.load_aggregate(id).await? {
            Some(aggregate) => {
                let document = mapper::to_document(&aggregate)?;
                self.store.upsert(document).await?;
                IndexingMetrics::record_document_indexed();
                info!(perfume_id = %id, "Indexed perfume");
                Ok(())
            }
            None => {
                self.store.delete(&id.to_string()).await?;
                IndexingMetrics::record_document_deleted();
                warn!(perfume_id = %id, "Source perfume gone, removed stale document");
                Err(SearchError::NotFound(id))
            }
        }
    }

    /// Remove one perfume's document. Idempotent: deleting an absent id
    /// succeeds and changes nothing.
    #[instrument(skip(self), fields(perfume_id = %id))]
    pub async fn delete_perfume(&self, id: Uuid) -> SearchResult<bool> {
        let existed = self.store.delete(&id.to_string()).await?;
        if existed {
            IndexingMetrics::record_document_deleted();
            info!(perfume_id = %id, "Deleted search document");
        }
        Ok(existed)
    }

    /// Walk the whole catalog and upsert every document.
    ///
    /// A failing document is logged, counted, and skipped. It never aborts
    /// the remaining stream. The walk is restartable: every completed upsert
    /// is already a valid terminal state for its id, and a re-run simply
    /// replaces everything again.
    pub async fn reindex_all(&self) -> SearchResult<ReindexReport> {
        let start = Instant::now();
        let mut report = ReindexReport::default();
        let mut offset = 0u64;

        info!("Starting full catalog reindex");

        loop {
            let batch = self.catalog.list_aggregates(offset, self.batch_size).await?;
            if batch.is_empty() {
                break;
            }
            offset += batch.len() as u64;

            for aggregate in &batch {
                let document = match mapper::to_document(aggregate) {
                    Ok(document) => document,
                    Err(e) => {
                        error!(perfume_id = %aggregate.id, error = %e, "Skipping unmappable aggregate");
                        IndexingMetrics::record_failure("mapping_input");
                        report.skipped += 1;
                        continue;
                    }
                };

                match self.store.upsert(document).await {
                    Ok(()) => report.indexed += 1,
                    Err(e) => {
                        error!(perfume_id = %aggregate.id, error = %e, "Skipping failed upsert");
                        IndexingMetrics::record_failure("store_write");
                        report.skipped += 1;
                    }
                }
            }
        }

        IndexingMetrics::record_reindex(report.indexed, report.skipped, start.elapsed());
        info!(
            indexed = report.indexed,
            skipped = report.skipped,
            "Full catalog reindex complete"
        );

        Ok(report)
    }
}

impl<C, S> IndexingService<C, S>
where
    C: CatalogReadRepository + 'static,
    S: SearchRepository + 'static,
{
    /// Run a full reindex on a background task and return immediately.
    ///
    /// The caller is only told the operation started; completion is visible
    /// through logs and metrics.
    pub fn spawn_reindex_all(&self) {
        let service = self.clone();

        tokio::spawn(async move {
            match service.reindex_all().await {
                Ok(report) => info!(
                    indexed = report.indexed,
                    skipped = report.skipped,
                    "Background reindex finished"
                ),
                Err(e) => error!(error = %e, "Background reindex failed"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockSearchRepository;
    use chrono::Utc;
    use domain_catalog::{
        BrandRef, CatalogResult, Concentration, MemberRating, PerfumeAggregate,
    };
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Catalog {}

        #[async_trait::async_trait]
        impl CatalogReadRepository for Catalog {
            async fn load_aggregate(&self, id: Uuid) -> CatalogResult<Option<PerfumeAggregate>>;
            async fn list_aggregates(&self, offset: u64, limit: u64) -> CatalogResult<Vec<PerfumeAggregate>>;
            async fn count_perfumes(&self) -> CatalogResult<u64>;
            async fn list_member_ratings(&self, member_id: Uuid) -> CatalogResult<Vec<MemberRating>>;
            async fn list_reviewer_ids(&self) -> CatalogResult<Vec<Uuid>>;
        }
    }

    fn aggregate(id: u128) -> PerfumeAggregate {
        PerfumeAggregate {
            id: Uuid::from_u128(id),
            name: format!("Perfume {}", id),
            description: String::new(),
            brand: Some(BrandRef {
                id: Some(Uuid::from_u128(1000 + id)),
                name: "Brand".to_string(),
            }),
            release_year: Some(2020),
            concentration: Concentration::Edt,
            image_url: None,
            average_rating: 4.0,
            review_count: 10,
            is_approved: true,
            notes: vec![],
            accords: vec![],
            designers: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_index_perfume_upserts_mapped_document() {
        let id = Uuid::from_u128(7);
        let mut catalog = MockCatalog::new();
        catalog
            .expect_load_aggregate()
            .with(eq(id))
            .returning(|id| Ok(Some(aggregate(id.as_u128()))));

        let mut store = MockSearchRepository::new();
        store
            .expect_upsert()
            .withf(move |doc| doc.id == id.to_string() && doc.name == "Perfume 7")
            .returning(|_| Ok(()));

        let service = IndexingService::new(Arc::new(catalog), Arc::new(store));
        service.index_perfume(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_index_perfume_is_idempotent() {
        let id = Uuid::from_u128(7);
        let mut catalog = MockCatalog::new();
        catalog
            .expect_load_aggregate()
            .times(2)
            .returning(|id| Ok(Some(aggregate(id.as_u128()))));

        let mut store = MockSearchRepository::new();
        // Same document is fully replaced on each call
        store
            .expect_upsert()
            .withf(move |doc| doc.id == id.to_string())
            .times(2)
            .returning(|_| Ok(()));

        let service = IndexingService::new(Arc::new(catalog), Arc::new(store));
        service.index_perfume(id).await.unwrap();
        service.index_perfume(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_index_perfume_missing_source_deletes_stale_document() {
        let id = Uuid::from_u128(9);
        let mut catalog = MockCatalog::new();
        catalog.expect_load_aggregate().returning(|_| Ok(None));

        let mut store = MockSearchRepository::new();
        store
            .expect_delete()
            .withf(move |got| got == id.to_string())
            .times(1)
            .returning(|_| Ok(true));

        let service = IndexingService::new(Arc::new(catalog), Arc::new(store));
        let err = service.index_perfume(id).await.unwrap_err();
        assert!(matches!(err, SearchError::NotFound(got) if got == id));
    }

    #[tokio::test]
    async fn test_index_perfume_store_failure_propagates() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_load_aggregate()
            .returning(|id| Ok(Some(aggregate(id.as_u128()))));

        let mut store = MockSearchRepository::new();
        store
            .expect_upsert()
            .returning(|_| Err(SearchError::StoreUnavailable("down".to_string())));

        let service = IndexingService::new(Arc::new(catalog), Arc::new(store));
        let err = service.index_perfume(Uuid::from_u128(1)).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_delete_perfume_absent_id_is_noop_success() {
        let catalog = MockCatalog::new();
        let mut store = MockSearchRepository::new();
        store.expect_delete().returning(|_| Ok(false));

        let service = IndexingService::new(Arc::new(catalog), Arc::new(store));
        let existed = service.delete_perfume(Uuid::from_u128(42)).await.unwrap();
        assert!(!existed);
    }

    #[tokio::test]
    async fn test_reindex_all_walks_every_batch() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_list_aggregates()
            .with(eq(0), eq(2))
            .returning(|_, _| Ok(vec![aggregate(1), aggregate(2)]));
        catalog
            .expect_list_aggregates()
            .with(eq(2), eq(2))
            .returning(|_, _| Ok(vec![aggregate(3)]));
        catalog
            .expect_list_aggregates()
            .with(eq(3), eq(2))
            .returning(|_, _| Ok(vec![]));

        let mut store = MockSearchRepository::new();
        store.expect_upsert().times(3).returning(|_| Ok(()));

        let service =
            IndexingService::new(Arc::new(catalog), Arc::new(store)).with_batch_size(2);
        let report = service.reindex_all().await.unwrap();

        assert_eq!(report.indexed, 3);
        assert_eq!(report.skipped, 0);
    }

    #[tokio::test]
    async fn test_reindex_all_skips_failing_documents() {
        let mut catalog = MockCatalog::new();
        catalog.expect_list_aggregates().with(eq(0), eq(10)).returning(|_, _| {
            let mut broken = aggregate(2);
            broken.id = Uuid::nil(); // unmappable
            Ok(vec![aggregate(1), broken, aggregate(3)])
        });
        catalog
            .expect_list_aggregates()
            .with(eq(3), eq(10))
            .returning(|_, _| Ok(vec![]));

        let mut store = MockSearchRepository::new();
        store
            .expect_upsert()
            .returning(|doc| {
                if doc.name == "Perfume 3" {
                    Err(SearchError::StoreUnavailable("blip".to_string()))
                } else {
                    Ok(())
                }
            });

        let service =
            IndexingService::new(Arc::new(catalog), Arc::new(store)).with_batch_size(10);
        let report = service.reindex_all().await.unwrap();

        assert_eq!(report.indexed, 1);
        assert_eq!(report.skipped, 2);
    }

    #[tokio::test]
    async fn test_reindex_all_rerun_converges() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_list_aggregates()
            .with(eq(0), eq(10))
            .times(2)
            .returning(|_, _| Ok(vec![aggregate(1), aggregate(2)]));
        catalog
            .expect_list_aggregates()
            .with(eq(2), eq(10))
            .times(2)
            .returning(|_, _| Ok(vec![]));

        let mut store = MockSearchRepository::new();
        // Re-running the walk replaces every document again, same content
        store.expect_upsert().times(4).returning(|_| Ok(()));

        let service =
            IndexingService::new(Arc::new(catalog), Arc::new(store)).with_batch_size(10);
        assert_eq!(service.reindex_all().await.unwrap().indexed, 2);
        assert_eq!(service.reindex_all().await.unwrap().indexed, 2);
    }
}
