use std::sync::Arc;

use freight_rates::application::handlers::estimate_handler::{router, AppState};
use freight_rates::config::RateEngineConfig;
use freight_rates::infrastructure::index_source_factory::IndexSourceFactory;
use freight_rates::persistence::history_repository::RateHistoryRepository;
use freight_rates::persistence::init_database;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freight_rates=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Freight rate estimator starting...");

    let config = RateEngineConfig::from_env()?;
    info!(
        catalog_version = config.catalog.version,
        indices = config.catalog.all_indices().len(),
        source_timeout = ?config.source_timeout,
        "Configuration loaded"
    );

    let pool = init_database(&config.database_url).await?;
    let bind_address = config.bind_address.clone();

    let engine = IndexSourceFactory::create_engine(config, &pool)?;
    let state = AppState {
        engine: Arc::new(engine),
        history: Arc::new(RateHistoryRepository::new(pool.clone())),
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on {}", bind_address);

    info!("Server started successfully. Press Ctrl+C to stop.");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down gracefully...");
    pool.close().await;

    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM. A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C signal"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received SIGTERM signal");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
