//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for the search API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Perfume Search API",
        version = "0.1.0",
        description = "Search, similarity, and recommendation queries over the perfume catalog"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/v1", api = domain_search::SearchApiDoc),
        (path = "/api/v1", api = domain_search::IndexingApiDoc)
    ),
    tags(
        (name = "search", description = "Perfume search and recommendation queries"),
        (name = "indexing", description = "Administrative indexing triggers")
    )
)]
pub struct ApiDoc;
