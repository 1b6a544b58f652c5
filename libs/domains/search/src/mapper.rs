//! Projection of relational perfume aggregates into search documents.
//!
//! The mapping is pure and deterministic: the same aggregate snapshot always
//! produces a field-for-field identical document. Incomplete associations
//! never fail the mapping; a missing target id becomes the nil-UUID
//! sentinel facet instead.

use std::collections::HashSet;

use domain_catalog::PerfumeAggregate;
use uuid::Uuid;

use crate::document::{AccordFacet, DesignerFacet, NoteFacet, PerfumeDocument};
use crate::error::{SearchError, SearchResult};

/// Map a fully loaded aggregate into its search document.
///
/// Fails only for structurally invalid input (a nil perfume id); everything
/// else maps totally.
pub fn to_document(aggregate: &PerfumeAggregate) -> SearchResult<PerfumeDocument> {
    if aggregate.id.is_nil() {
        return Err(SearchError::MappingInput(
            "perfume aggregate has a nil id".to_string(),
        ));
    }

    let (brand_id, brand_name) = match &aggregate.brand {
        Some(brand) => (brand.id.unwrap_or(Uuid::nil()), brand.name.clone()),
        None => (Uuid::nil(), String::new()),
    };

    let mut seen = HashSet::new();
    let notes = aggregate
        .notes
        .iter()
        .map(|n| NoteFacet {
            id: n.id.unwrap_or(Uuid::nil()),
            name: n.name.clone(),
            note_type: n.note_type,
        })
        .filter(|facet| seen.insert(facet.id))
        .collect();

    let mut seen = HashSet::new();
    let accords = aggregate
        .accords
        .iter()
        .map(|a| AccordFacet {
            id: a.id.unwrap_or(Uuid::nil()),
            name: a.name.clone(),
        })
        .filter(|facet| seen.insert(facet.id))
        .collect();

    let mut seen = HashSet::new();
    let designers = aggregate
        .designers
        .iter()
        .map(|d| DesignerFacet {
            id: d.id.unwrap_or(Uuid::nil()),
            name: d.name.clone(),
            role: d.role,
        })
        .filter(|facet| seen.insert(facet.id))
        .collect();

    Ok(PerfumeDocument {
        id: aggregate.id.to_string(),
        name: aggregate.name.clone(),
        description: aggregate.description.clone(),
        brand_id,
        brand_name,
        release_year: aggregate.release_year,
        concentration: aggregate.concentration,
        image_url: aggregate.image_url.clone(),
        average_rating: aggregate.average_rating,
        review_count: aggregate.review_count,
        is_approved: aggregate.is_approved,
        notes,
        accords,
        designers,
        created_at: aggregate.created_at,
        updated_at: aggregate.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain_catalog::{
        AccordRef, BrandRef, Concentration, DesignerAssociation, DesignerRole, NoteAssociation,
        NoteType,
    };

    fn sample_aggregate() -> PerfumeAggregate {
        PerfumeAggregate {
            id: Uuid::from_u128(1),
            name: "Vetiver Extraordinaire".to_string(),
            description: "A dry woody vetiver".to_string(),
            brand: Some(BrandRef {
                id: Some(Uuid::from_u128(10)),
                name: "Maison Test".to_string(),
            }),
            release_year: Some(2002),
            concentration: Concentration::Edp,
            image_url: Some("https://img.example/v.jpg".to_string()),
            average_rating: 4.2,
            review_count: 37,
            is_approved: true,
            notes: vec![
                NoteAssociation {
                    id: Some(Uuid::from_u128(100)),
                    name: "Vetiver".to_string(),
                    note_type: NoteType::Base,
                },
                NoteAssociation {
                    id: Some(Uuid::from_u128(101)),
                    name: "Bergamot".to_string(),
                    note_type: NoteType::Top,
                },
            ],
            accords: vec![AccordRef {
                id: Some(Uuid::from_u128(200)),
                name: "Woody".to_string(),
            }],
            designers: vec![DesignerAssociation {
                id: Some(Uuid::from_u128(300)),
                name: "D. Ropion".to_string(),
                role: DesignerRole::Perfumer,
            }],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let aggregate = sample_aggregate();

        let first = to_document(&aggregate).unwrap();
        let second = to_document(&aggregate).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_maps_all_scalar_fields() {
        let aggregate = sample_aggregate();
        let doc = to_document(&aggregate).unwrap();

        assert_eq!(doc.id, aggregate.id.to_string());
        assert_eq!(doc.name, "Vetiver Extraordinaire");
        assert_eq!(doc.brand_name, "Maison Test");
        assert_eq!(doc.release_year, Some(2002));
        assert_eq!(doc.average_rating, 4.2);
        assert_eq!(doc.review_count, 37);
        assert!(doc.is_approved);
    }

    #[test]
    fn test_missing_brand_maps_to_nil_sentinel() {
        let mut aggregate = sample_aggregate();
        aggregate.brand = None;

        let doc = to_document(&aggregate).unwrap();
        assert_eq!(doc.brand_id, Uuid::nil());
        assert_eq!(doc.brand_name, "");
    }

    #[test]
    fn test_missing_note_target_maps_to_nil_sentinel() {
        let mut aggregate = sample_aggregate();
        aggregate.notes.push(NoteAssociation {
            id: None,
            name: String::new(),
            note_type: NoteType::Middle,
        });

        let doc = to_document(&aggregate).unwrap();
        assert!(doc.notes.iter().any(|n| n.id == Uuid::nil()));
    }

    #[test]
    fn test_duplicate_facets_collapse_by_id() {
        let mut aggregate = sample_aggregate();
        aggregate.accords.push(AccordRef {
            id: Some(Uuid::from_u128(200)),
            name: "Woody".to_string(),
        });

        let doc = to_document(&aggregate).unwrap();
        assert_eq!(doc.accords.len(), 1);
    }

    #[test]
    fn test_nil_aggregate_id_is_mapping_input_error() {
        let mut aggregate = sample_aggregate();
        aggregate.id = Uuid::nil();

        let err = to_document(&aggregate).unwrap_err();
        assert!(matches!(err, SearchError::MappingInput(_)));
    }
}
