//! Index Source Factory
//!
//! Builds the adapters the engine reads from. Adapters are created once at
//! startup and shared by every estimate.

use std::sync::Arc;

use reqwest::Client;
use sqlx::SqlitePool;
use tracing::info;

use crate::config::RateEngineConfig;
use crate::domain::errors::ConfigError;
use crate::domain::repositories::index_source::IndexSource;
use crate::domain::services::rate_engine::RateAggregationEngine;
use crate::domain::services::region_resolver::RegionResolver;
use crate::domain::services::source_registry::SourceRegistry;
use crate::infrastructure::http_index_source::HttpIndexSource;
use crate::infrastructure::timeout_source::TimeoutIndexSource;
use crate::persistence::fuel_repository::SqliteFuelSurcharge;
use crate::persistence::index_repository::SqliteIndexRepository;
use crate::persistence::port_repository::SqlitePortRepository;
use crate::persistence::seasonality_repository::SqliteSeasonalityRepository;

/// Factory for index adapters and the engine built on them
pub struct IndexSourceFactory;

impl IndexSourceFactory {
    /// The index API if configured, otherwise stored index values
    pub fn create_source(config: &RateEngineConfig, pool: &SqlitePool) -> Result<Arc<dyn IndexSource>, ConfigError> {
        let inner: Arc<dyn IndexSource> = match &config.index_api_url {
            Some(url) => {
                let client = Client::builder()
                    .user_agent(concat!("freight-rates/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .map_err(|e| ConfigError::InvalidUrl(format!("HTTP client: {}", e)))?;
                info!(url = %url, "✓ Using index API");
                Arc::new(HttpIndexSource::new(client, url)?)
            }
            None => {
                info!(max_age_days = config.index_max_age_days, "✓ Using stored index values");
                Arc::new(SqliteIndexRepository::new(pool.clone(), config.index_max_age_days))
            }
        };

        Ok(Arc::new(TimeoutIndexSource::new(inner, config.source_timeout)))
    }

    pub fn create_registry(config: &RateEngineConfig, pool: &SqlitePool) -> Result<SourceRegistry, ConfigError> {
        let source = Self::create_source(config, pool)?;
        let registry = SourceRegistry::uniform(&config.catalog, source);
        info!("IndexSourceFactory registered {} index adapters", registry.len());
        Ok(registry)
    }

    /// Wire the engine to SQLite-backed route data
    pub fn create_engine(config: RateEngineConfig, pool: &SqlitePool) -> Result<RateAggregationEngine, ConfigError> {
        let registry = Self::create_registry(&config, pool)?;
        let regions = RegionResolver::new(
            Some(Arc::new(SqlitePortRepository::new(pool.clone()))),
            config.region_cache_size,
        );
        let seasonality = SqliteSeasonalityRepository::new(pool.clone());
        let fuel = SqliteFuelSurcharge::new(pool.clone(), config.fuel.clone());

        RateAggregationEngine::new(
            config,
            registry,
            Arc::new(regions),
            Arc::new(seasonality),
            Arc::new(fuel),
        )
    }
}
