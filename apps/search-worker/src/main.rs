//! Search Indexing Worker
//!
//! Background service keeping the search store in sync with the relational
//! catalog:
//!
//! ```text
//! Redis Stream (perfumes:events)
//!   ↓ (Consumer Group: search_indexers)
//! PerfumeEventWorker
//!   ↓
//! IndexingService ── mapper ──► MongoDB (perfume_documents)
//!   ▲
//! IndexingScheduler (daily reindex, weekly preference recomputation)
//! ```
//!
//! Also runs as a one-shot job for operational reindex/recompute runs.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_catalog::PgCatalogRepository;
use domain_search::{
    IndexingScheduler, IndexingService, MongoPreferenceRepository, MongoSearchRepository,
    PerfumeEventWorker, PreferenceAnalysisService, SyncConfig,
};
use eyre::WrapErr;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "search-worker")]
#[command(about = "Keep the perfume search store in sync with the catalog")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume perfume events and run the reconciliation schedules (default)
    Serve,

    /// Run a one-shot full reindex and exit
    Reindex,

    /// Recompute all member preference vectors and exit
    RecomputePreferences,
}

struct Services {
    indexing: IndexingService<PgCatalogRepository, MongoSearchRepository>,
    analysis: PreferenceAnalysisService<PgCatalogRepository, MongoPreferenceRepository>,
    redis: redis::aio::ConnectionManager,
}

async fn build_services(config: &Config) -> eyre::Result<Services> {
    info!("Connecting to PostgreSQL...");
    let db = database::postgres::connect_from_config_with_retry(&config.postgres, None)
        .await
        .wrap_err("PostgreSQL connection failed")?;

    info!("Connecting to MongoDB...");
    let mongo = database::mongodb::connect_from_config_with_retry(&config.mongo, None)
        .await
        .wrap_err("MongoDB connection failed")?;

    domain_search::mongo::init_indexes(&mongo)
        .await
        .map_err(|e| eyre::eyre!("Index initialization failed: {}", e))?;

    info!("Connecting to Redis...");
    let redis = database::redis::connect_from_config_with_retry(&config.redis, None)
        .await
        .wrap_err("Redis connection failed")?;

    let catalog = Arc::new(PgCatalogRepository::new(db));
    let store = Arc::new(MongoSearchRepository::new(&mongo));
    let preferences = Arc::new(MongoPreferenceRepository::new(&mongo));

    Ok(Services {
        indexing: IndexingService::new(Arc::clone(&catalog), store),
        analysis: PreferenceAnalysisService::new(catalog, preferences),
        redis,
    })
}

async fn serve(config: Config, services: Services) -> eyre::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let scheduler = IndexingScheduler::start(
        config.schedule.clone(),
        services.indexing.clone(),
        services.analysis.clone(),
    )
    .await
    .map_err(|e| eyre::eyre!("Scheduler startup failed: {}", e))?;

    let worker = PerfumeEventWorker::new(services.redis, services.indexing, SyncConfig::default());
    worker
        .run(shutdown_rx)
        .await
        .map_err(|e| eyre::eyre!("Event worker failed: {}", e))?;

    if let Err(e) = scheduler.shutdown().await {
        error!(error = %e, "Scheduler shutdown failed");
    }

    info!("Search worker stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);
    observability::init_metrics();

    info!(name = %config.app.name, version = %config.app.version, "Starting search worker");

    let cli = Cli::parse();
    let services = build_services(&config).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, services).await?,

        Commands::Reindex => {
            let report = services
                .indexing
                .reindex_all()
                .await
                .map_err(|e| eyre::eyre!("Reindex failed: {}", e))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::RecomputePreferences => {
            let report = services
                .analysis
                .recompute_all()
                .await
                .map_err(|e| eyre::eyre!("Preference recomputation failed: {}", e))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating shutdown..."),
    }
}
