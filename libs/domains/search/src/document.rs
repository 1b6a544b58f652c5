use chrono::{DateTime, Utc};
use domain_catalog::{Concentration, DesignerRole, NoteType};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A note entry on a search document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NoteFacet {
    /// Note id; nil UUID when the source association had no target
    pub id: Uuid,
    pub name: String,
    pub note_type: NoteType,
}

/// An accord entry on a search document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AccordFacet {
    pub id: Uuid,
    pub name: String,
}

/// A designer entry on a search document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DesignerFacet {
    pub id: Uuid,
    pub name: String,
    pub role: DesignerRole,
}

/// Denormalized search projection of a perfume aggregate.
///
/// The document store owns nothing that cannot be regenerated from the
/// relational source plus the mapper: every write replaces the document
/// wholesale, keyed by the stringified perfume id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PerfumeDocument {
    /// Stringified perfume UUID (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub description: String,
    /// Brand id; nil UUID when the brand association is absent
    pub brand_id: Uuid,
    pub brand_name: String,
    pub release_year: Option<i32>,
    pub concentration: Concentration,
    pub image_url: Option<String>,
    pub average_rating: f64,
    pub review_count: i64,
    /// Unapproved documents are never visible in end-user query results
    pub is_approved: bool,
    pub notes: Vec<NoteFacet>,
    pub accords: Vec<AccordFacet>,
    pub designers: Vec<DesignerFacet>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of ranked search results with the total match count
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchPage {
    pub items: Vec<PerfumeDocument>,
    /// Total matches across all pages
    pub total: u64,
    /// Zero-based page index
    pub page: u64,
    pub page_size: u64,
}

impl SearchPage {
    pub fn empty(page: u64, page_size: u64) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            page_size,
        }
    }
}
