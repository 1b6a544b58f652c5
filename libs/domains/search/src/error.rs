use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_catalog::CatalogError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SearchError {
    /// The source aggregate is structurally invalid (programmer error),
    /// logged and skipped during batch work instead of crashing it.
    #[error("Invalid mapping input: {0}")]
    MappingInput(String),

    /// The relational source no longer has the id; a compensating delete of
    /// the stale document has already been issued when this surfaces.
    #[error("Perfume not found: {0}")]
    NotFound(Uuid),

    /// Caller-supplied criteria violate the range invariants; rejected
    /// before any store access.
    #[error("Invalid search criteria: {0}")]
    InvalidCriteria(String),

    /// Transient I/O failure against a backing store; the caller layer
    /// retries with backoff.
    #[error("Search store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type SearchResult<T> = Result<T, SearchError>;

impl SearchError {
    /// Whether retrying can ever succeed. Permanent errors go straight to
    /// the dead letter queue.
    pub fn is_transient(&self) -> bool {
        matches!(self, SearchError::StoreUnavailable(_))
    }
}

impl From<mongodb::error::Error> for SearchError {
    fn from(err: mongodb::error::Error) -> Self {
        SearchError::StoreUnavailable(err.to_string())
    }
}

impl From<redis::RedisError> for SearchError {
    fn from(err: redis::RedisError) -> Self {
        SearchError::StoreUnavailable(err.to_string())
    }
}

impl From<CatalogError> for SearchError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => SearchError::NotFound(id),
            // The relational read is an I/O boundary like the document
            // store: failures are transient from the sync layer's view.
            CatalogError::Database(msg) => SearchError::StoreUnavailable(msg),
        }
    }
}

/// Convert SearchError to AppError for standardized error responses
impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::NotFound(id) => AppError::NotFound(format!("Perfume {} not found", id)),
            SearchError::InvalidCriteria(msg) => AppError::BadRequest(msg),
            SearchError::MappingInput(msg) => AppError::InternalServerError(msg),
            SearchError::StoreUnavailable(msg) => AppError::ServiceUnavailable(msg),
            SearchError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
