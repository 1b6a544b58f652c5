//! Pure query semantics: filtering, scoring, total ordering, pagination.
//!
//! The store adapter pushes cheap boolean filters into MongoDB, but every
//! ranking decision funnels through this module so the ordering contract has
//! exactly one implementation. All orderings end with an id tiebreak, which
//! makes them total and keeps offset pagination stable.

use std::cmp::Ordering;

use crate::criteria::{SearchCriteria, SortBy};
use crate::document::{PerfumeDocument, SearchPage};
use crate::preferences::PreferenceVector;

/// Per-term relevance weights for keyword matching
const NAME_WEIGHT: f64 = 3.0;
const BRAND_WEIGHT: f64 = 2.0;
const DESIGNER_WEIGHT: f64 = 2.0;
const DESCRIPTION_WEIGHT: f64 = 1.0;
/// Bonus when the whole phrase appears in the name
const PHRASE_BONUS: f64 = 2.0;

/// Similarity weights for shared-facet overlap
const SHARED_ACCORD_WEIGHT: f64 = 2.0;
const SHARED_NOTE_WEIGHT: f64 = 1.5;
const SAME_BRAND_WEIGHT: f64 = 2.5;
const YEAR_WINDOW_WEIGHT: f64 = 1.0;
/// Release years within this window count as "contemporaries"
const YEAR_WINDOW: i32 = 5;

/// Filter, rank, and paginate documents for the given criteria.
///
/// Assumes the criteria already passed validation.
pub fn execute(docs: Vec<PerfumeDocument>, criteria: &SearchCriteria) -> SearchPage {
    let keyword = criteria.normalized_keyword();

    let mut ranked: Vec<(f64, PerfumeDocument)> = docs
        .into_iter()
        .filter(|doc| matches(doc, criteria))
        .filter_map(|doc| match keyword {
            Some(keyword) => {
                let score = relevance_score(&doc, keyword);
                // A keyword that matches nothing excludes the document
                (score > 0.0).then_some((score, doc))
            }
            None => Some((0.0, doc)),
        })
        .collect();

    ranked.sort_by(|a, b| compare_ranked(a, b, criteria.sort, keyword.is_some()));

    let total = ranked.len() as u64;
    let start = (criteria.page * criteria.page_size) as usize;

    let items = ranked
        .into_iter()
        .map(|(_, doc)| doc)
        .skip(start)
        .take(criteria.page_size as usize)
        .collect();

    SearchPage {
        items,
        total,
        page: criteria.page,
        page_size: criteria.page_size,
    }
}

/// Boolean filter set over every present criteria field.
///
/// The implicit approved-only filter is always applied here: unapproved
/// documents are invisible to end-user queries no matter what the caller
/// asks for.
pub fn matches(doc: &PerfumeDocument, criteria: &SearchCriteria) -> bool {
    if !doc.is_approved {
        return false;
    }

    if let Some(brand) = &criteria.brand_name {
        if !doc.brand_name.eq_ignore_ascii_case(brand.trim()) {
            return false;
        }
    }

    // The note filter is a (type, name) pair; the type alone does not
    // constrain the result set.
    if let Some(note_name) = &criteria.note_name {
        let hit = doc.notes.iter().any(|n| {
            n.name.eq_ignore_ascii_case(note_name.trim())
                && criteria.note_type.is_none_or(|t| n.note_type == t)
        });
        if !hit {
            return false;
        }
    }

    if let Some(accord) = &criteria.accord_name {
        if !doc
            .accords
            .iter()
            .any(|a| a.name.eq_ignore_ascii_case(accord.trim()))
        {
            return false;
        }
    }

    if criteria.year_from.is_some() || criteria.year_to.is_some() {
        let Some(year) = doc.release_year else {
            return false;
        };
        if criteria.year_from.is_some_and(|from| year < from) {
            return false;
        }
        if criteria.year_to.is_some_and(|to| year > to) {
            return false;
        }
    }

    if criteria
        .min_rating
        .is_some_and(|min| doc.average_rating < min)
    {
        return false;
    }
    if criteria
        .max_rating
        .is_some_and(|max| doc.average_rating > max)
    {
        return false;
    }

    true
}

/// Field-weighted term matching over name/brand/designers/description.
pub fn relevance_score(doc: &PerfumeDocument, keyword: &str) -> f64 {
    let keyword = keyword.to_lowercase();
    let name = doc.name.to_lowercase();
    let brand = doc.brand_name.to_lowercase();
    let description = doc.description.to_lowercase();
    let designers: Vec<String> = doc.designers.iter().map(|d| d.name.to_lowercase()).collect();

    let terms: Vec<&str> = keyword.split_whitespace().collect();
    let mut score = 0.0;

    for term in &terms {
        if name.contains(term) {
            score += NAME_WEIGHT;
        }
        if !brand.is_empty() && brand.contains(term) {
            score += BRAND_WEIGHT;
        }
        if designers.iter().any(|d| d.contains(term)) {
            score += DESIGNER_WEIGHT;
        }
        if description.contains(term) {
            score += DESCRIPTION_WEIGHT;
        }
    }

    if terms.len() > 1 && name.contains(&keyword) {
        score += PHRASE_BONUS;
    }

    score
}

fn compare_ranked(
    a: &(f64, PerfumeDocument),
    b: &(f64, PerfumeDocument),
    sort: SortBy,
    has_keyword: bool,
) -> Ordering {
    match sort {
        SortBy::Relevance if has_keyword => b
            .0
            .total_cmp(&a.0)
            .then_with(|| b.1.average_rating.total_cmp(&a.1.average_rating))
            .then_with(|| a.1.id.cmp(&b.1.id)),
        // Relevance without a keyword degrades to the rating order
        SortBy::Relevance | SortBy::RatingDesc => b
            .1
            .average_rating
            .total_cmp(&a.1.average_rating)
            .then_with(|| a.1.id.cmp(&b.1.id)),
        SortBy::YearDesc => {
            // Missing years sort after every present year
            let year_a = a.1.release_year.unwrap_or(i32::MIN);
            let year_b = b.1.release_year.unwrap_or(i32::MIN);
            year_b.cmp(&year_a).then_with(|| a.1.id.cmp(&b.1.id))
        }
        SortBy::NameAsc => a
            .1
            .name
            .to_lowercase()
            .cmp(&b.1.name.to_lowercase())
            .then_with(|| a.1.id.cmp(&b.1.id)),
    }
}

/// Weighted overlap between a candidate and the reference document.
pub fn similarity_score(doc: &PerfumeDocument, reference: &PerfumeDocument) -> f64 {
    let mut score = 0.0;

    let shared_accords = reference
        .accords
        .iter()
        .filter(|a| !a.id.is_nil())
        .filter(|a| doc.accords.iter().any(|c| c.id == a.id))
        .count();
    score += shared_accords as f64 * SHARED_ACCORD_WEIGHT;

    let shared_notes = reference
        .notes
        .iter()
        .filter(|n| !n.id.is_nil())
        .filter(|n| doc.notes.iter().any(|c| c.id == n.id))
        .count();
    score += shared_notes as f64 * SHARED_NOTE_WEIGHT;

    if !reference.brand_id.is_nil() && doc.brand_id == reference.brand_id {
        score += SAME_BRAND_WEIGHT;
    }

    if let (Some(a), Some(b)) = (doc.release_year, reference.release_year) {
        if (a - b).abs() <= YEAR_WINDOW {
            score += YEAR_WINDOW_WEIGHT;
        }
    }

    score
}

/// Rank approved candidates by similarity to the reference, best first.
///
/// The reference itself and zero-overlap candidates are excluded.
pub fn rank_similar(
    docs: Vec<PerfumeDocument>,
    reference: &PerfumeDocument,
    limit: usize,
) -> Vec<PerfumeDocument> {
    let mut ranked: Vec<(f64, PerfumeDocument)> = docs
        .into_iter()
        .filter(|doc| doc.is_approved && doc.id != reference.id)
        .filter_map(|doc| {
            let score = similarity_score(&doc, reference);
            (score > 0.0).then_some((score, doc))
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| b.1.average_rating.total_cmp(&a.1.average_rating))
            .then_with(|| a.1.id.cmp(&b.1.id))
    });

    ranked.into_iter().map(|(_, doc)| doc).take(limit).collect()
}

/// Preference score: summed matched weights, normalized by the number of
/// matched axes (notes, accords, brand) so a document that brushes many
/// axes is not unfairly favored over a focused match. The divisor floors at
/// one; both the axis granularity and the floor are tunable constants of
/// this module, not inherited behavior.
pub fn preference_score(doc: &PerfumeDocument, preferences: &PreferenceVector) -> f64 {
    let mut sum = 0.0;
    let mut matched_axes = 0usize;

    let note_sum: f64 = doc
        .notes
        .iter()
        .filter_map(|n| preferences.note_weight(&n.name))
        .sum();
    if note_sum != 0.0 {
        matched_axes += 1;
        sum += note_sum;
    }

    let accord_sum: f64 = doc
        .accords
        .iter()
        .filter_map(|a| preferences.accord_weight(&a.name))
        .sum();
    if accord_sum != 0.0 {
        matched_axes += 1;
        sum += accord_sum;
    }

    if let Some(brand_weight) = preferences.brand_weight(&doc.brand_name) {
        if brand_weight != 0.0 {
            matched_axes += 1;
            sum += brand_weight;
        }
    }

    sum / matched_axes.max(1) as f64
}

/// Rank approved documents by preference score, best first.
///
/// A vector with no signal yields an empty ranking: there is no basis for
/// recommendation, and an arbitrary default order would be misleading.
pub fn rank_recommended(
    docs: Vec<PerfumeDocument>,
    preferences: &PreferenceVector,
    limit: usize,
) -> Vec<PerfumeDocument> {
    if !preferences.has_signal() {
        return Vec::new();
    }

    let mut ranked: Vec<(f64, PerfumeDocument)> = docs
        .into_iter()
        .filter(|doc| doc.is_approved)
        .filter_map(|doc| {
            let score = preference_score(&doc, preferences);
            (score > 0.0).then_some((score, doc))
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| b.1.average_rating.total_cmp(&a.1.average_rating))
            .then_with(|| a.1.id.cmp(&b.1.id))
    });

    ranked.into_iter().map(|(_, doc)| doc).take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{AccordFacet, NoteFacet};
    use chrono::Utc;
    use domain_catalog::{Concentration, NoteType};
    use uuid::Uuid;

    fn doc(id: u128, name: &str) -> PerfumeDocument {
        PerfumeDocument {
            id: Uuid::from_u128(id).to_string(),
            name: name.to_string(),
            description: String::new(),
            brand_id: Uuid::nil(),
            brand_name: String::new(),
            release_year: None,
            concentration: Concentration::Edp,
            image_url: None,
            average_rating: 0.0,
            review_count: 0,
            is_approved: true,
            notes: vec![],
            accords: vec![],
            designers: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn accord(id: u128, name: &str) -> AccordFacet {
        AccordFacet {
            id: Uuid::from_u128(id),
            name: name.to_string(),
        }
    }

    fn note(id: u128, name: &str, note_type: NoteType) -> NoteFacet {
        NoteFacet {
            id: Uuid::from_u128(id),
            name: name.to_string(),
            note_type,
        }
    }

    #[test]
    fn test_unapproved_documents_never_match() {
        let mut hidden = doc(1, "Hidden");
        hidden.is_approved = false;

        let page = execute(vec![hidden], &SearchCriteria::default());
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_keyword_excludes_documents_without_any_match() {
        let mut rose = doc(1, "Rose Absolue");
        rose.description = "a rose soliflore".to_string();
        let oud = doc(2, "Oud Royal");

        let criteria = SearchCriteria {
            keyword: Some("rose".to_string()),
            ..Default::default()
        };

        let page = execute(vec![rose, oud], &criteria);
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Rose Absolue");
    }

    #[test]
    fn test_relevance_prefers_name_over_description_match() {
        let mut in_name = doc(2, "Vetiver Classic");
        in_name.average_rating = 1.0;
        let mut in_description = doc(1, "Something Else");
        in_description.description = "with a hint of vetiver".to_string();
        in_description.average_rating = 5.0;

        let criteria = SearchCriteria {
            keyword: Some("vetiver".to_string()),
            ..Default::default()
        };

        let page = execute(vec![in_description, in_name], &criteria);
        assert_eq!(page.items[0].name, "Vetiver Classic");
    }

    #[test]
    fn test_relevance_ties_break_by_rating_then_id() {
        let mut low = doc(1, "Iris One");
        low.average_rating = 3.0;
        let mut high = doc(2, "Iris Two");
        high.average_rating = 4.5;
        let mut equal = doc(3, "Iris Tre");
        equal.average_rating = 4.5;

        let criteria = SearchCriteria {
            keyword: Some("iris".to_string()),
            ..Default::default()
        };

        let page = execute(vec![low, equal, high], &criteria);
        let names: Vec<&str> = page.items.iter().map(|d| d.name.as_str()).collect();
        // 4.5 before 3.0; equal ratings ordered by id ascending
        assert_eq!(names, vec!["Iris Two", "Iris Tre", "Iris One"]);
    }

    #[test]
    fn test_year_desc_sort_with_missing_years_last() {
        let mut old = doc(1, "Old");
        old.release_year = Some(1995);
        let mut new = doc(2, "New");
        new.release_year = Some(2021);
        let unknown = doc(3, "Unknown");

        let criteria = SearchCriteria {
            sort: SortBy::YearDesc,
            ..Default::default()
        };

        let page = execute(vec![old, unknown, new], &criteria);
        let names: Vec<&str> = page.items.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["New", "Old", "Unknown"]);
    }

    #[test]
    fn test_name_asc_sort_is_case_insensitive() {
        let a = doc(1, "ambre nuit");
        let b = doc(2, "Bois dArgent");
        let c = doc(3, "Aqua Celestia");

        let criteria = SearchCriteria {
            sort: SortBy::NameAsc,
            ..Default::default()
        };

        let page = execute(vec![b, a, c], &criteria);
        let names: Vec<&str> = page.items.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["ambre nuit", "Aqua Celestia", "Bois dArgent"]);
    }

    #[test]
    fn test_year_range_filter_excludes_unknown_years() {
        let mut inside = doc(1, "Inside");
        inside.release_year = Some(2015);
        let mut outside = doc(2, "Outside");
        outside.release_year = Some(2005);
        let unknown = doc(3, "Unknown");

        let criteria = SearchCriteria {
            year_from: Some(2010),
            year_to: Some(2020),
            ..Default::default()
        };

        let page = execute(vec![inside, outside, unknown], &criteria);
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Inside");
    }

    #[test]
    fn test_rating_range_filter() {
        let mut low = doc(1, "Low");
        low.average_rating = 2.0;
        let mut high = doc(2, "High");
        high.average_rating = 4.6;

        let criteria = SearchCriteria {
            min_rating: Some(4.0),
            ..Default::default()
        };

        let page = execute(vec![low, high], &criteria);
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "High");
    }

    #[test]
    fn test_note_filter_requires_matching_type_when_given() {
        let mut top_citrus = doc(1, "Top Citrus");
        top_citrus.notes = vec![note(10, "Bergamot", NoteType::Top)];
        let mut base_citrus = doc(2, "Base Citrus");
        base_citrus.notes = vec![note(10, "Bergamot", NoteType::Base)];

        let criteria = SearchCriteria {
            note_name: Some("bergamot".to_string()),
            note_type: Some(NoteType::Top),
            ..Default::default()
        };

        let page = execute(vec![top_citrus, base_citrus], &criteria);
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Top Citrus");
    }

    #[test]
    fn test_pagination_is_stable_with_no_duplicates_or_gaps() {
        let docs: Vec<PerfumeDocument> = (1..=25u128)
            .map(|i| {
                let mut d = doc(i, &format!("Perfume {:02}", i));
                d.average_rating = (i % 7) as f64;
                d
            })
            .collect();

        let mut seen = Vec::new();
        for page_index in 0..3 {
            let criteria = SearchCriteria {
                sort: SortBy::RatingDesc,
                page: page_index,
                page_size: 10,
                ..Default::default()
            };
            let page = execute(docs.clone(), &criteria);
            assert_eq!(page.total, 25);
            seen.extend(page.items.into_iter().map(|d| d.id));
        }

        assert_eq!(seen.len(), 25);
        let mut unique = seen.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 25, "pages must not duplicate documents");
    }

    #[test]
    fn test_page_past_the_end_is_empty_with_correct_total() {
        let docs = vec![doc(1, "One"), doc(2, "Two")];

        let criteria = SearchCriteria {
            page: 5,
            page_size: 10,
            ..Default::default()
        };

        let page = execute(docs, &criteria);
        assert_eq!(page.total, 2);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_similarity_ranks_shared_brand_and_accord_first() {
        let brand = Uuid::from_u128(50);

        let mut reference = doc(1, "Reference");
        reference.brand_id = brand;
        reference.brand_name = "X".to_string();
        reference.accords = vec![accord(20, "Amber")];

        let mut close = doc(2, "Close");
        close.brand_id = brand;
        close.brand_name = "X".to_string();
        close.accords = vec![accord(20, "Amber")];

        let mut distant = doc(3, "Distant");
        distant.release_year = Some(2000);
        reference.release_year = Some(2001);

        let ranked = rank_similar(vec![distant, close], &reference, 10);
        assert_eq!(ranked[0].name, "Close");
    }

    #[test]
    fn test_similarity_excludes_reference_and_zero_overlap() {
        let reference = doc(1, "Reference");
        let unrelated = doc(2, "Unrelated");

        let ranked = rank_similar(vec![reference.clone(), unrelated], &reference, 10);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_recommendation_example_woody_beats_floral() {
        let mut woody = doc(1, "A");
        woody.average_rating = 4.5;
        woody.accords = vec![accord(10, "woody"), accord(11, "citrus")];

        let mut floral = doc(2, "B");
        floral.average_rating = 4.8;
        floral.accords = vec![accord(12, "floral")];

        let mut prefs = PreferenceVector::default();
        prefs.add_accord("woody", 1.0);

        let ranked = rank_recommended(vec![floral, woody], &prefs, 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "A");
    }

    #[test]
    fn test_recommendation_with_no_signal_is_empty() {
        let candidate = doc(1, "Anything");

        let ranked = rank_recommended(vec![candidate], &PreferenceVector::default(), 10);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_recommendation_never_returns_unapproved() {
        let mut hidden = doc(1, "Hidden");
        hidden.is_approved = false;
        hidden.accords = vec![accord(10, "woody")];

        let mut prefs = PreferenceVector::default();
        prefs.add_accord("woody", 1.0);

        assert!(rank_recommended(vec![hidden], &prefs, 10).is_empty());
    }

    #[test]
    fn test_preference_score_normalizes_by_matched_axes() {
        let mut prefs = PreferenceVector::default();
        prefs.add_note("vanilla", 0.4);
        prefs.add_accord("woody", 0.6);
        prefs.add_brand("maison", 0.5);

        let mut all_axes = doc(1, "All");
        all_axes.notes = vec![note(10, "Vanilla", NoteType::Base)];
        all_axes.accords = vec![accord(20, "Woody")];
        all_axes.brand_name = "Maison".to_string();

        let mut one_axis = doc(2, "One");
        one_axis.accords = vec![accord(20, "Woody")];

        // (0.4 + 0.6 + 0.5) / 3 = 0.5 vs 0.6 / 1
        assert!(preference_score(&all_axes, &prefs) < preference_score(&one_axis, &prefs));
    }

    #[test]
    fn test_negative_preference_pushes_document_out() {
        let mut disliked = doc(1, "Aquatic Thing");
        disliked.accords = vec![accord(10, "aquatic")];

        let mut prefs = PreferenceVector::default();
        prefs.add_accord("aquatic", -1.0);

        assert!(rank_recommended(vec![disliked], &prefs, 10).is_empty());
    }
}
