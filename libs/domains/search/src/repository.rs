use async_trait::async_trait;

use crate::criteria::SearchCriteria;
use crate::document::{PerfumeDocument, SearchPage};
use crate::error::SearchResult;
use crate::preferences::PreferenceVector;

/// Port over the search document store.
///
/// Writes are idempotent: `upsert` fully replaces the document keyed by id
/// and `delete` of an absent id is a no-op success. Concurrent writers
/// therefore converge without coordination: last write wins per id, which
/// is the intended outcome for a rebuildable projection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchRepository: Send + Sync {
    /// Insert-or-fully-replace a document keyed by its id
    async fn upsert(&self, document: PerfumeDocument) -> SearchResult<()>;

    /// Remove a document; returns false (success) when it was already absent
    async fn delete(&self, id: &str) -> SearchResult<bool>;

    /// Fetch a single document by id
    async fn get_by_id(&self, id: &str) -> SearchResult<Option<PerfumeDocument>>;

    /// Count all stored documents
    async fn count(&self) -> SearchResult<u64>;

    /// Ranked, paginated keyword/filter search (approved documents only)
    async fn search(&self, criteria: &SearchCriteria) -> SearchResult<SearchPage>;

    /// Approved documents ranked by facet overlap with the reference id.
    /// An unknown reference yields an empty sequence.
    async fn find_similar(&self, id: &str, limit: usize) -> SearchResult<Vec<PerfumeDocument>>;

    /// Approved documents ranked by the member preference vector.
    /// A vector with no signal yields an empty sequence.
    async fn find_recommended(
        &self,
        preferences: &PreferenceVector,
        limit: usize,
    ) -> SearchResult<Vec<PerfumeDocument>>;
}
