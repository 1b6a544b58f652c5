//! Perfume Search API
//!
//! HTTP surface over the search-and-recommendation pipeline: keyword search,
//! similar-perfume lookup, personalized recommendations, and administrative
//! reindex triggers.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use axum_helpers::{health_router, shutdown_signal};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_catalog::PgCatalogRepository;
use domain_search::{
    handlers, IndexingService, MongoPreferenceRepository, MongoSearchRepository, SearchService,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod openapi;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);
    observability::init_metrics();

    info!(name = %config.app.name, version = %config.app.version, "Starting search API");

    // Relational catalog (read port)
    info!("Connecting to PostgreSQL...");
    let db = database::postgres::connect_from_config_with_retry(&config.postgres, None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    // Search document store
    info!("Connecting to MongoDB...");
    let mongo = database::mongodb::connect_from_config_with_retry(&config.mongo, None)
        .await
        .map_err(|e| eyre::eyre!("MongoDB connection failed: {}", e))?;

    domain_search::mongo::init_indexes(&mongo)
        .await
        .map_err(|e| eyre::eyre!("Index initialization failed: {}", e))?;

    let catalog = Arc::new(PgCatalogRepository::new(db));
    let store = Arc::new(MongoSearchRepository::new(&mongo));
    let preferences = Arc::new(MongoPreferenceRepository::new(&mongo));

    let search_service = SearchService::new(Arc::clone(&store), preferences);
    let indexing_service = IndexingService::new(catalog, store);

    let api_routes = handlers::search_router(search_service)
        .merge(handlers::admin_router(indexing_service));

    let app = Router::new()
        .nest("/api/v1", api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .merge(health_router(config.app))
        .route("/metrics", get(observability::metrics_handler))
        .layer(TraceLayer::new_for_http());

    let address = config.server.address();
    let listener = TcpListener::bind(&address).await?;
    info!(address = %address, "Search API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Search API shutdown complete");
    Ok(())
}
