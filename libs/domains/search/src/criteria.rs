use domain_catalog::NoteType;
use serde::Deserialize;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};

use crate::error::{SearchError, SearchResult};

/// Result ordering for keyword/filter searches
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString, Default, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortBy {
    /// Text relevance when a keyword is present, rating otherwise
    #[default]
    Relevance,
    RatingDesc,
    YearDesc,
    NameAsc,
}

fn default_page_size() -> u64 {
    20
}

/// Caller-supplied search descriptor.
///
/// Every field is optional except the page request; absent fields simply do
/// not constrain the result set. `validate` must pass before the criteria
/// reach the store.
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct SearchCriteria {
    /// Free-text keyword matched against name/description/brand/designers
    pub keyword: Option<String>,
    /// Exact brand name (case-insensitive)
    pub brand_name: Option<String>,
    /// Pyramid position for the note filter; only used with note_name
    pub note_type: Option<NoteType>,
    /// Note name contained in the document's notes
    pub note_name: Option<String>,
    /// Accord name contained in the document's accords
    pub accord_name: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    #[serde(default)]
    pub sort: SortBy,
    /// Zero-based page index
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            keyword: None,
            brand_name: None,
            note_type: None,
            note_name: None,
            accord_name: None,
            year_from: None,
            year_to: None,
            min_rating: None,
            max_rating: None,
            sort: SortBy::default(),
            page: 0,
            page_size: default_page_size(),
        }
    }
}

impl SearchCriteria {
    pub const MAX_PAGE_SIZE: u64 = 100;

    /// Reject criteria that violate the range invariants.
    ///
    /// A single-sided bound is unbounded on the other side and always valid.
    pub fn validate(&self) -> SearchResult<()> {
        if let (Some(from), Some(to)) = (self.year_from, self.year_to) {
            if from > to {
                return Err(SearchError::InvalidCriteria(format!(
                    "year_from ({}) must not exceed year_to ({})",
                    from, to
                )));
            }
        }

        if let (Some(min), Some(max)) = (self.min_rating, self.max_rating) {
            if min > max {
                return Err(SearchError::InvalidCriteria(format!(
                    "min_rating ({}) must not exceed max_rating ({})",
                    min, max
                )));
            }
        }

        if self.page_size == 0 || self.page_size > Self::MAX_PAGE_SIZE {
            return Err(SearchError::InvalidCriteria(format!(
                "page_size must be between 1 and {}",
                Self::MAX_PAGE_SIZE
            )));
        }

        Ok(())
    }

    /// Keyword trimmed to None when blank
    pub fn normalized_keyword(&self) -> Option<&str> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_criteria_is_valid() {
        assert!(SearchCriteria::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_year_range_rejected() {
        let criteria = SearchCriteria {
            year_from: Some(2020),
            year_to: Some(2019),
            ..Default::default()
        };

        let err = criteria.validate().unwrap_err();
        assert!(matches!(err, SearchError::InvalidCriteria(_)));
    }

    #[test]
    fn test_single_sided_year_bound_is_valid() {
        let criteria = SearchCriteria {
            year_from: Some(2020),
            ..Default::default()
        };
        assert!(criteria.validate().is_ok());
    }

    #[test]
    fn test_inverted_rating_range_rejected() {
        let criteria = SearchCriteria {
            min_rating: Some(4.5),
            max_rating: Some(3.0),
            ..Default::default()
        };
        assert!(criteria.validate().is_err());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let criteria = SearchCriteria {
            page_size: 0,
            ..Default::default()
        };
        assert!(criteria.validate().is_err());
    }

    #[test]
    fn test_oversized_page_rejected() {
        let criteria = SearchCriteria {
            page_size: 500,
            ..Default::default()
        };
        assert!(criteria.validate().is_err());
    }

    #[test]
    fn test_blank_keyword_normalizes_to_none() {
        let criteria = SearchCriteria {
            keyword: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(criteria.normalized_keyword(), None);
    }
}
