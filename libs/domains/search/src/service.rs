use std::sync::Arc;
use std::time::Instant;

use observability::SearchMetrics;
use tracing::instrument;
use uuid::Uuid;

use crate::criteria::SearchCriteria;
use crate::document::{PerfumeDocument, SearchPage};
use crate::error::SearchResult;
use crate::preferences::{PreferenceRepository, PreferenceVector};
use crate::repository::SearchRepository;

/// Service layer in front of the search store.
///
/// Validates criteria before they reach the store, resolves member ids to
/// stored preference vectors, clamps limits, and records query metrics.
pub struct SearchService<S, P> {
    store: Arc<S>,
    preferences: Arc<P>,
}

impl<S, P> Clone for SearchService<S, P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            preferences: Arc::clone(&self.preferences),
        }
    }
}

impl<S, P> SearchService<S, P>
where
    S: SearchRepository,
    P: PreferenceRepository,
{
    /// Upper bound on similar/recommended result counts
    pub const MAX_LIMIT: usize = 50;
    pub const DEFAULT_LIMIT: usize = 10;

    pub fn new(store: Arc<S>, preferences: Arc<P>) -> Self {
        Self { store, preferences }
    }

    fn clamp_limit(limit: Option<usize>) -> usize {
        limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// Ranked, paginated search. Invalid criteria are rejected before any
    /// store access; an empty result page is success, never an error.
    #[instrument(skip(self, criteria))]
    pub async fn search(&self, criteria: SearchCriteria) -> SearchResult<SearchPage> {
        criteria.validate()?;

        let start = Instant::now();
        let page = self.store.search(&criteria).await?;
        SearchMetrics::record_query("search", start.elapsed());

        Ok(page)
    }

    /// Documents similar to the given perfume; empty when it is unknown.
    #[instrument(skip(self))]
    pub async fn find_similar(
        &self,
        id: Uuid,
        limit: Option<usize>,
    ) -> SearchResult<Vec<PerfumeDocument>> {
        let start = Instant::now();
        let documents = self
            .store
            .find_similar(&id.to_string(), Self::clamp_limit(limit))
            .await?;
        SearchMetrics::record_query("similar", start.elapsed());

        Ok(documents)
    }

    /// Recommendations from a member's stored preference vector.
    ///
    /// A member without a stored vector (or with a zero vector) gets an
    /// empty list, since there is no basis for recommendation yet.
    #[instrument(skip(self))]
    pub async fn recommend_for_member(
        &self,
        member_id: Uuid,
        limit: Option<usize>,
    ) -> SearchResult<Vec<PerfumeDocument>> {
        let Some(stored) = self.preferences.get_by_member(member_id).await? else {
            return Ok(Vec::new());
        };

        self.recommend_for_vector(stored.vector, limit).await
    }

    /// Recommendations for an ad-hoc preference vector.
    #[instrument(skip(self, vector))]
    pub async fn recommend_for_vector(
        &self,
        vector: PreferenceVector,
        limit: Option<usize>,
    ) -> SearchResult<Vec<PerfumeDocument>> {
        if !vector.has_signal() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let documents = self
            .store
            .find_recommended(&vector, Self::clamp_limit(limit))
            .await?;
        SearchMetrics::record_query("recommend", start.elapsed());

        Ok(documents)
    }
}
