use std::path::Path;
use std::time::Duration;

use crate::domain::entities::catalog::IndexCatalog;
use crate::domain::entities::index::ModifierCategory;
use crate::domain::errors::ConfigError;

/// Reliability scoring constants
#[derive(Debug, Clone, PartialEq)]
pub struct ReliabilityConfig {
    pub base: f64,
    pub per_source_bonus: f64,
    pub max_source_bonus: f64,
    /// Penalty per unit of relative standard deviation between core indices
    pub dispersion_penalty_factor: f64,
    pub max_dispersion_penalty: f64,
    pub min: f64,
    pub max: f64,
    /// Reliability reported when no core index was available
    pub fallback: f64,
    /// Reliability reported when the computation itself failed
    pub failure: f64,
}

/// Min/max range: `spread = spread_base + (1 - reliability) * spread_scale`
#[derive(Debug, Clone, PartialEq)]
pub struct RangeConfig {
    pub spread_base: f64,
    pub spread_scale: f64,
}

/// Band of the deterministic synthetic rate
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackBand {
    pub min: f64,
    pub max: f64,
}

/// Maximum relative move of each modifier category (0.2 = ±20%)
#[derive(Debug, Clone, PartialEq)]
pub struct ModifierClamps {
    pub charter_market: f64,
    pub demand: f64,
}

impl ModifierClamps {
    pub fn for_category(&self, category: ModifierCategory) -> f64 {
        match category {
            ModifierCategory::CharterMarket => self.charter_market,
            ModifierCategory::Demand => self.demand,
        }
    }
}

/// Bunker consumption model used by the fuel surcharge calculator
#[derive(Debug, Clone, PartialEq)]
pub struct FuelModelConfig {
    pub fuel_type: String,
    /// Tonnes of fuel attributed to one TEU per 1000 nautical miles
    pub tonnes_per_teu_per_1000nm: f64,
    /// Great-circle distance multiplier approximating real sailing routes
    pub routing_factor: f64,
    pub reefer_multiplier: f64,
}

/// Full configuration of the rate estimator
#[derive(Debug, Clone)]
pub struct RateEngineConfig {
    pub catalog: IndexCatalog,
    pub reliability: ReliabilityConfig,
    pub range: RangeConfig,
    pub fallback_band: FallbackBand,
    pub clamps: ModifierClamps,
    pub fuel: FuelModelConfig,
    pub source_timeout: Duration,
    /// Cached index values older than this are only used via fallback search
    pub index_max_age_days: i64,
    pub region_cache_size: usize,
    pub database_url: String,
    pub bind_address: String,
    /// Base URL of a JSON index API; cached database values are used if absent
    pub index_api_url: Option<String>,
}

impl Default for RateEngineConfig {
    fn default() -> Self {
        RateEngineConfig {
            catalog: IndexCatalog::default(),
            reliability: ReliabilityConfig {
                base: 0.7,
                per_source_bonus: 0.05,
                max_source_bonus: 0.2,
                dispersion_penalty_factor: 2.0,
                max_dispersion_penalty: 0.3,
                min: 0.4,
                max: 1.0,
                fallback: 0.5,
                failure: 0.4,
            },
            range: RangeConfig {
                spread_base: 0.10,
                spread_scale: 0.10,
            },
            fallback_band: FallbackBand {
                min: 1500.0,
                max: 3000.0,
            },
            clamps: ModifierClamps {
                charter_market: 0.20,
                demand: 0.10,
            },
            fuel: FuelModelConfig {
                fuel_type: "VLSFO".to_string(),
                tonnes_per_teu_per_1000nm: 0.032,
                routing_factor: 1.25,
                reefer_multiplier: 1.3,
            },
            source_timeout: Duration::from_secs(10),
            index_max_age_days: 14,
            region_cache_size: 512,
            database_url: "sqlite://data/freight_rates.db".to_string(),
            bind_address: "127.0.0.1:3000".to_string(),
            index_api_url: None,
        }
    }
}

impl RateEngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<RateEngineConfig, ConfigError> {
        let mut config = RateEngineConfig::default();

        if let Ok(path) = std::env::var("RATE_CATALOG_PATH") {
            config.catalog = IndexCatalog::from_json_file(Path::new(&path))?;
            tracing::info!(
                path = %path,
                version = config.catalog.version,
                "Loaded index catalog override"
            );
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                config.database_url = url;
            }
        }

        if let Ok(addr) = std::env::var("BIND_ADDRESS") {
            if !addr.trim().is_empty() {
                config.bind_address = addr;
            }
        }

        if let Ok(url) = std::env::var("INDEX_API_URL") {
            if !url.trim().is_empty() {
                config.index_api_url = Some(url);
            }
        }

        if let Ok(timeout) = std::env::var("SOURCE_TIMEOUT_MILLISECONDS") {
            match timeout.parse::<u64>() {
                Ok(value) if (100..=60_000).contains(&value) => {
                    config.source_timeout = Duration::from_millis(value);
                }
                Ok(value) => {
                    tracing::warn!(
                        "Invalid SOURCE_TIMEOUT_MILLISECONDS value: {} (must be between 100 and 60000), using default: {:?}",
                        value, config.source_timeout
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse SOURCE_TIMEOUT_MILLISECONDS '{}': {}, using default: {:?}",
                        timeout,
                        e,
                        config.source_timeout
                    );
                }
            }
        }

        if let Ok(max_age) = std::env::var("INDEX_MAX_AGE_DAYS") {
            if let Ok(value) = max_age.parse::<i64>() {
                if (1..=365).contains(&value) {
                    config.index_max_age_days = value;
                }
            }
        }

        if let Ok(size) = std::env::var("REGION_CACHE_SIZE") {
            if let Ok(value) = size.parse::<usize>() {
                if value > 0 {
                    config.region_cache_size = value;
                }
            }
        }

        if let Some(value) = env_f64("RELIABILITY_BASE", 0.0..=1.0) {
            config.reliability.base = value;
        }

        if let Some(value) = env_f64("RELIABILITY_MIN", 0.0..=1.0) {
            config.reliability.min = value;
        }

        if let Some(value) = env_f64("RELIABILITY_MAX", 0.0..=1.0) {
            config.reliability.max = value;
        }

        if let Some(value) = env_f64("CHARTER_MODIFIER_CLAMP", 0.0..=1.0) {
            config.clamps.charter_market = value;
        }

        if let Some(value) = env_f64("DEMAND_MODIFIER_CLAMP", 0.0..=1.0) {
            config.clamps.demand = value;
        }

        if let Some(value) = env_f64("FALLBACK_RATE_MIN", 1.0..=100_000.0) {
            config.fallback_band.min = value;
        }

        if let Some(value) = env_f64("FALLBACK_RATE_MAX", 1.0..=100_000.0) {
            config.fallback_band.max = value;
        }

        if let Some(value) = env_f64("FUEL_TONNES_PER_TEU_PER_1000NM", 0.0..=1.0) {
            config.fuel.tonnes_per_teu_per_1000nm = value;
        }

        if let Ok(fuel_type) = std::env::var("FUEL_TYPE") {
            if !fuel_type.trim().is_empty() {
                config.fuel.fuel_type = fuel_type.trim().to_uppercase();
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject internally inconsistent bands
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.catalog.validate()?;

        let r = &self.reliability;
        if !(0.0..=1.0).contains(&r.min) || !(0.0..=1.0).contains(&r.max) || r.min > r.max {
            return Err(ConfigError::InvalidBand {
                name: "reliability".to_string(),
                min: r.min,
                max: r.max,
            });
        }

        for (name, value) in [("reliability.fallback", r.fallback), ("reliability.failure", r.failure)] {
            if value < r.min || value > r.max {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    value,
                });
            }
        }

        let band = &self.fallback_band;
        if !(band.min > 0.0 && band.min <= band.max && band.max.is_finite()) {
            return Err(ConfigError::InvalidBand {
                name: "fallback_band".to_string(),
                min: band.min,
                max: band.max,
            });
        }

        for (name, value) in [
            ("clamps.charter_market", self.clamps.charter_market),
            ("clamps.demand", self.clamps.demand),
            ("range.spread_base", self.range.spread_base),
            ("range.spread_scale", self.range.spread_scale),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    value,
                });
            }
        }

        Ok(())
    }
}

fn env_f64(name: &str, range: std::ops::RangeInclusive<f64>) -> Option<f64> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<f64>() {
        Ok(value) if range.contains(&value) => Some(value),
        Ok(value) => {
            tracing::warn!(
                "Invalid {} value: {} (must be between {} and {}), using default",
                name,
                value,
                range.start(),
                range.end()
            );
            None
        }
        Err(e) => {
            tracing::warn!("Failed to parse {} '{}': {}, using default", name, raw, e);
            None
        }
    }
}
