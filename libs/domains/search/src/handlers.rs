use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use domain_catalog::CatalogReadRepository;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi};
use uuid::Uuid;

use crate::criteria::SearchCriteria;
use crate::document::{AccordFacet, DesignerFacet, NoteFacet, PerfumeDocument, SearchPage};
use crate::error::{SearchError, SearchResult};
use crate::indexer::IndexingService;
use crate::preferences::{PreferenceRepository, PreferenceVector};
use crate::repository::SearchRepository;
use crate::service::SearchService;

/// OpenAPI documentation for the search API
#[derive(OpenApi)]
#[openapi(
    paths(search, find_similar, recommend_for_member, recommend_preview),
    components(schemas(
        PerfumeDocument,
        SearchPage,
        NoteFacet,
        AccordFacet,
        DesignerFacet,
        PreferenceVector,
    )),
    tags(
        (name = "search", description = "Perfume search and recommendation queries")
    )
)]
pub struct SearchApiDoc;

/// OpenAPI documentation for the admin indexing API
#[derive(OpenApi)]
#[openapi(
    paths(trigger_reindex_all, trigger_reindex_one),
    tags(
        (name = "indexing", description = "Administrative indexing triggers")
    )
)]
pub struct IndexingApiDoc;

#[derive(Debug, Deserialize, IntoParams)]
pub struct LimitParams {
    /// Maximum results to return (clamped server-side)
    pub limit: Option<usize>,
}

/// Search the perfume catalog
#[utoipa::path(
    get,
    path = "/search",
    tag = "search",
    params(SearchCriteria),
    responses(
        (status = 200, description = "Ranked result page", body = SearchPage),
        (status = 400, description = "Invalid criteria"),
        (status = 503, description = "Search store unavailable")
    )
)]
pub async fn search<S: SearchRepository, P: PreferenceRepository>(
    State(service): State<Arc<SearchService<S, P>>>,
    Query(criteria): Query<SearchCriteria>,
) -> SearchResult<Json<SearchPage>> {
    let page = service.search(criteria).await?;
    Ok(Json(page))
}

/// Perfumes similar to the given one
#[utoipa::path(
    get,
    path = "/perfumes/{id}/similar",
    tag = "search",
    params(
        ("id" = String, Path, description = "Perfume ID"),
        LimitParams
    ),
    responses(
        (status = 200, description = "Similar perfumes, best match first", body = Vec<PerfumeDocument>),
        (status = 400, description = "Invalid perfume ID"),
        (status = 503, description = "Search store unavailable")
    )
)]
pub async fn find_similar<S: SearchRepository, P: PreferenceRepository>(
    State(service): State<Arc<SearchService<S, P>>>,
    Path(id): Path<String>,
    Query(params): Query<LimitParams>,
) -> SearchResult<Json<Vec<PerfumeDocument>>> {
    let perfume_id = Uuid::parse_str(&id)
        .map_err(|_| SearchError::InvalidCriteria("Invalid perfume id".to_string()))?;

    let documents = service.find_similar(perfume_id, params.limit).await?;
    Ok(Json(documents))
}

/// Personalized recommendations from the member's stored preference vector
#[utoipa::path(
    get,
    path = "/recommendations/{member_id}",
    tag = "search",
    params(
        ("member_id" = String, Path, description = "Member ID"),
        LimitParams
    ),
    responses(
        (status = 200, description = "Recommended perfumes, best first (empty without preference signal)", body = Vec<PerfumeDocument>),
        (status = 400, description = "Invalid member ID"),
        (status = 503, description = "Search store unavailable")
    )
)]
pub async fn recommend_for_member<S: SearchRepository, P: PreferenceRepository>(
    State(service): State<Arc<SearchService<S, P>>>,
    Path(member_id): Path<String>,
    Query(params): Query<LimitParams>,
) -> SearchResult<Json<Vec<PerfumeDocument>>> {
    let member_id = Uuid::parse_str(&member_id)
        .map_err(|_| SearchError::InvalidCriteria("Invalid member id".to_string()))?;

    let documents = service.recommend_for_member(member_id, params.limit).await?;
    Ok(Json(documents))
}

/// Recommendations for an ad-hoc preference vector (preview/tuning)
#[utoipa::path(
    post,
    path = "/recommendations/preview",
    tag = "search",
    params(LimitParams),
    request_body = PreferenceVector,
    responses(
        (status = 200, description = "Recommended perfumes for the supplied vector", body = Vec<PerfumeDocument>),
        (status = 503, description = "Search store unavailable")
    )
)]
pub async fn recommend_preview<S: SearchRepository, P: PreferenceRepository>(
    State(service): State<Arc<SearchService<S, P>>>,
    Query(params): Query<LimitParams>,
    Json(vector): Json<PreferenceVector>,
) -> SearchResult<Json<Vec<PerfumeDocument>>> {
    let documents = service.recommend_for_vector(vector, params.limit).await?;
    Ok(Json(documents))
}

/// Kick off a full catalog reindex in the background
#[utoipa::path(
    post,
    path = "/admin/reindex",
    tag = "indexing",
    responses(
        (status = 202, description = "Reindex started")
    )
)]
pub async fn trigger_reindex_all<C, S>(
    State(indexing): State<Arc<IndexingService<C, S>>>,
) -> impl IntoResponse
where
    C: CatalogReadRepository + 'static,
    S: SearchRepository + 'static,
{
    indexing.spawn_reindex_all();

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "reindex started" })),
    )
}

/// Reindex a single perfume synchronously
#[utoipa::path(
    post,
    path = "/admin/reindex/{id}",
    tag = "indexing",
    params(
        ("id" = String, Path, description = "Perfume ID")
    ),
    responses(
        (status = 200, description = "Perfume reindexed"),
        (status = 400, description = "Invalid perfume ID"),
        (status = 404, description = "Perfume not found (stale document removed)"),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn trigger_reindex_one<C, S>(
    State(indexing): State<Arc<IndexingService<C, S>>>,
    Path(id): Path<String>,
) -> SearchResult<impl IntoResponse>
where
    C: CatalogReadRepository + 'static,
    S: SearchRepository + 'static,
{
    let perfume_id = Uuid::parse_str(&id)
        .map_err(|_| SearchError::InvalidCriteria("Invalid perfume id".to_string()))?;

    indexing.index_perfume(perfume_id).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "status": "indexed", "id": perfume_id })),
    ))
}

/// Router for the public search surface
pub fn search_router<S, P>(service: SearchService<S, P>) -> Router
where
    S: SearchRepository + 'static,
    P: PreferenceRepository + 'static,
{
    let shared = Arc::new(service);

    Router::new()
        .route("/search", get(search))
        .route("/perfumes/{id}/similar", get(find_similar))
        .route("/recommendations/{member_id}", get(recommend_for_member))
        .route("/recommendations/preview", post(recommend_preview))
        .with_state(shared)
}

/// Router for the admin indexing triggers
pub fn admin_router<C, S>(indexing: IndexingService<C, S>) -> Router
where
    C: CatalogReadRepository + 'static,
    S: SearchRepository + 'static,
{
    let shared = Arc::new(indexing);

    Router::new()
        .route("/admin/reindex", post(trigger_reindex_all))
        .route("/admin/reindex/{id}", post(trigger_reindex_one))
        .with_state(shared)
}
