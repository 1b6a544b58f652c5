use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::SearchResult;

/// Weighted taste profile used to bias recommendation ranking.
///
/// Keys are normalized to lowercase facet names. Weights may be negative
/// (dislikes push a document down). The vector is an opaque ranking input:
/// the search side only reads weights, it never cares how they were derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PreferenceVector {
    #[serde(default)]
    pub notes: HashMap<String, f64>,
    #[serde(default)]
    pub accords: HashMap<String, f64>,
    #[serde(default)]
    pub brands: HashMap<String, f64>,
}

impl PreferenceVector {
    /// True when at least one weight is nonzero. A vector without signal
    /// gives no basis for recommendation.
    pub fn has_signal(&self) -> bool {
        self.notes
            .values()
            .chain(self.accords.values())
            .chain(self.brands.values())
            .any(|w| *w != 0.0)
    }

    pub fn note_weight(&self, name: &str) -> Option<f64> {
        self.notes.get(&name.to_lowercase()).copied()
    }

    pub fn accord_weight(&self, name: &str) -> Option<f64> {
        self.accords.get(&name.to_lowercase()).copied()
    }

    pub fn brand_weight(&self, name: &str) -> Option<f64> {
        self.brands.get(&name.to_lowercase()).copied()
    }

    /// Add to a note weight, creating the entry on first touch
    pub fn add_note(&mut self, name: &str, weight: f64) {
        *self.notes.entry(name.to_lowercase()).or_default() += weight;
    }

    pub fn add_accord(&mut self, name: &str, weight: f64) {
        *self.accords.entry(name.to_lowercase()).or_default() += weight;
    }

    pub fn add_brand(&mut self, name: &str, weight: f64) {
        *self.brands.entry(name.to_lowercase()).or_default() += weight;
    }

    /// L1-normalize each axis so members with long histories do not dominate
    /// the score scale. Axes with no mass are left untouched.
    pub fn normalize(&mut self) {
        for axis in [&mut self.notes, &mut self.accords, &mut self.brands] {
            let mass: f64 = axis.values().map(|w| w.abs()).sum();
            if mass > 0.0 {
                for weight in axis.values_mut() {
                    *weight /= mass;
                }
            }
        }
    }
}

/// A member's stored preference vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MemberPreferences {
    /// Member id (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "member_id")]
    pub member_id: Uuid,
    pub vector: PreferenceVector,
    pub computed_at: DateTime<Utc>,
}

/// Persistence port for member preference vectors
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    /// Fetch a member's stored vector
    async fn get_by_member(&self, member_id: Uuid) -> SearchResult<Option<MemberPreferences>>;

    /// Insert-or-fully-replace a member's vector
    async fn upsert(&self, preferences: MemberPreferences) -> SearchResult<()>;
}
