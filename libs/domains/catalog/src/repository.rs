use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CatalogResult;
use crate::models::{MemberRating, PerfumeAggregate};

/// Read port over the relational perfume catalog.
///
/// Implementations must return fully materialized, acyclic snapshots; no
/// lazy association loading happens behind the trait boundary. The batch listing is
/// keyed by a stable order so a consumer can restart a full walk from any
/// offset and observe every row exactly once (absent concurrent writes).
#[async_trait]
pub trait CatalogReadRepository: Send + Sync {
    /// Load a single perfume aggregate with all of its associations
    async fn load_aggregate(&self, id: Uuid) -> CatalogResult<Option<PerfumeAggregate>>;

    /// List aggregates in stable id order, for batch walks of the catalog
    async fn list_aggregates(&self, offset: u64, limit: u64) -> CatalogResult<Vec<PerfumeAggregate>>;

    /// Count all perfumes
    async fn count_perfumes(&self) -> CatalogResult<u64>;

    /// All review ratings left by one member
    async fn list_member_ratings(&self, member_id: Uuid) -> CatalogResult<Vec<MemberRating>>;

    /// Distinct ids of members who have left at least one review
    async fn list_reviewer_ids(&self) -> CatalogResult<Vec<Uuid>>;
}
