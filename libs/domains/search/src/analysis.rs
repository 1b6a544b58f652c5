//! Member preference analysis.
//!
//! Derives a weighted taste profile from a member's review history: each
//! rating contributes its distance from the scale midpoint to every facet of
//! the reviewed perfume, so loved perfumes pull their notes/accords/brand up
//! and panned ones push them down. The resulting vector is an opaque input
//! to the recommendation ranking.

use std::sync::Arc;

use chrono::Utc;
use domain_catalog::CatalogReadRepository;
use observability::IndexingMetrics;
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::SearchResult;
use crate::preferences::{MemberPreferences, PreferenceRepository, PreferenceVector};

/// Ratings above this pull facets up, below push them down (five-star scale)
const RATING_MIDPOINT: f64 = 3.0;

/// Outcome of a full preference recomputation
#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
pub struct RecomputeReport {
    pub computed: usize,
    pub skipped: usize,
}

/// Computes and stores per-member preference vectors
pub struct PreferenceAnalysisService<C, P> {
    catalog: Arc<C>,
    preferences: Arc<P>,
}

impl<C, P> Clone for PreferenceAnalysisService<C, P> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            preferences: Arc::clone(&self.preferences),
        }
    }
}

impl<C, P> PreferenceAnalysisService<C, P>
where
    C: CatalogReadRepository,
    P: PreferenceRepository,
{
    pub fn new(catalog: Arc<C>, preferences: Arc<P>) -> Self {
        Self {
            catalog,
            preferences,
        }
    }

    /// Fold a member's ratings into a normalized preference vector.
    ///
    /// Reviews of perfumes that no longer exist are silently skipped. A
    /// member with no usable reviews yields a vector without signal.
    #[instrument(skip(self), fields(member_id = %member_id))]
    pub async fn compute_vector(&self, member_id: Uuid) -> SearchResult<PreferenceVector> {
        let ratings = self.catalog.list_member_ratings(member_id).await?;
        let mut vector = PreferenceVector::default();

        for rating in &ratings {
            let Some(aggregate) = self.catalog.load_aggregate(rating.perfume_id).await? else {
                continue;
            };

            let weight = rating.rating - RATING_MIDPOINT;
            if weight == 0.0 {
                continue;
            }

            for note in &aggregate.notes {
                if !note.name.is_empty() {
                    vector.add_note(&note.name, weight);
                }
            }
            for accord in &aggregate.accords {
                if !accord.name.is_empty() {
                    vector.add_accord(&accord.name, weight);
                }
            }
            if let Some(brand) = &aggregate.brand {
                if !brand.name.is_empty() {
                    vector.add_brand(&brand.name, weight);
                }
            }
        }

        vector.normalize();
        Ok(vector)
    }

    /// Recompute and store the vector for one member.
    pub async fn recompute_member(&self, member_id: Uuid) -> SearchResult<()> {
        let vector = self.compute_vector(member_id).await?;

        self.preferences
            .upsert(MemberPreferences {
                member_id,
                vector,
                computed_at: Utc::now(),
            })
            .await?;

        IndexingMetrics::record_preference_recomputed();
        Ok(())
    }

    /// Recompute vectors for every member with reviews.
    ///
    /// A failing member is logged and skipped; the sweep always finishes.
    pub async fn recompute_all(&self) -> SearchResult<RecomputeReport> {
        let members = self.catalog.list_reviewer_ids().await?;
        let mut report = RecomputeReport::default();

        info!(members = members.len(), "Recomputing member preference vectors");

        for member_id in members {
            match self.recompute_member(member_id).await {
                Ok(()) => report.computed += 1,
                Err(e) => {
                    warn!(member_id = %member_id, error = %e, "Skipping preference recompute");
                    report.skipped += 1;
                }
            }
        }

        info!(
            computed = report.computed,
            skipped = report.skipped,
            "Preference recomputation complete"
        );

        Ok(report)
    }
}

impl<C, P> PreferenceAnalysisService<C, P>
where
    C: CatalogReadRepository + 'static,
    P: PreferenceRepository + 'static,
{
    /// Run a full recomputation on a background task and return immediately.
    pub fn spawn_recompute_all(&self) {
        let service = self.clone();

        tokio::spawn(async move {
            if let Err(e) = service.recompute_all().await {
                error!(error = %e, "Background preference recomputation failed");
            }
        });
    }
}
