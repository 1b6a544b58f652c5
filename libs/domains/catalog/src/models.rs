use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

/// Pyramid position of a note within a perfume
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "note_type")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NoteType {
    #[sea_orm(string_value = "top")]
    Top,
    #[default]
    #[sea_orm(string_value = "middle")]
    Middle,
    #[sea_orm(string_value = "base")]
    Base,
}

/// Role a designer played for a perfume
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "designer_role")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DesignerRole {
    #[sea_orm(string_value = "perfumer")]
    Perfumer,
    #[sea_orm(string_value = "bottle")]
    Bottle,
    #[default]
    #[sea_orm(string_value = "unknown")]
    Unknown,
}

/// Fragrance concentration code
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "concentration")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Concentration {
    #[sea_orm(string_value = "parfum")]
    Parfum,
    #[sea_orm(string_value = "edp")]
    Edp,
    #[sea_orm(string_value = "edt")]
    Edt,
    #[sea_orm(string_value = "cologne")]
    Cologne,
    #[default]
    #[sea_orm(string_value = "other")]
    Other,
}

/// Brand reference carried by an aggregate.
///
/// The id is absent when the brand row is gone; downstream mapping uses a
/// sentinel for that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandRef {
    pub id: Option<Uuid>,
    pub name: String,
}

/// A note association tagged with its pyramid position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteAssociation {
    pub id: Option<Uuid>,
    pub name: String,
    pub note_type: NoteType,
}

/// An accord reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccordRef {
    pub id: Option<Uuid>,
    pub name: String,
}

/// A designer association tagged with its role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignerAssociation {
    pub id: Option<Uuid>,
    pub name: String,
    pub role: DesignerRole,
}

/// Fully materialized snapshot of a perfume and its associations.
///
/// This is the unit the search indexing pipeline consumes. Every association
/// is loaded eagerly at read time; there are no lazy fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfumeAggregate {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub brand: Option<BrandRef>,
    pub release_year: Option<i32>,
    pub concentration: Concentration,
    pub image_url: Option<String>,
    pub average_rating: f64,
    pub review_count: i64,
    pub is_approved: bool,
    pub notes: Vec<NoteAssociation>,
    pub accords: Vec<AccordRef>,
    pub designers: Vec<DesignerAssociation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A member's review rating of a perfume (input to preference analysis)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRating {
    pub member_id: Uuid,
    pub perfume_id: Uuid,
    /// Five-star scale, 1.0..=5.0
    pub rating: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_type_serialization() {
        assert_eq!(NoteType::Top.to_string(), "top");
        assert_eq!(NoteType::Base.to_string(), "base");

        let parsed: NoteType = "middle".parse().unwrap();
        assert_eq!(parsed, NoteType::Middle);
    }

    #[test]
    fn test_designer_role_round_trip() {
        let json = serde_json::to_string(&DesignerRole::Perfumer).unwrap();
        assert_eq!(json, "\"perfumer\"");

        let parsed: DesignerRole = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, DesignerRole::Perfumer);
    }

    #[test]
    fn test_concentration_defaults_to_other() {
        assert_eq!(Concentration::default(), Concentration::Other);
    }
}
