//! Persistence Layer
//!
//! SQLite storage for the route data the estimator consults and for the
//! estimates it has produced, with async access via sqlx.
//!
//! # Database Schema
//!
//! ## ports
//! - id: Port identifier used by callers
//! - code: UN/LOCODE (e.g., "CNSHA")
//! - name, region, latitude, longitude
//!
//! ## index_values
//! - index_code: Index code (e.g., "SCFI")
//! - value, change: Published value and change
//! - index_date: Publication date
//!
//! ## seasonality_factors
//! - origin_region, destination_region ("*" matches any destination)
//! - month: 1-12
//! - factor, confidence
//!
//! ## fuel_prices
//! - fuel_type (e.g., "VLSFO"), price per tonne, effective_date
//!
//! ## rate_history
//! - One row per estimate served: route, container, rate figures,
//!   reliability, sources used, fallback flag and error

pub mod fuel_repository;
pub mod history_repository;
pub mod index_repository;
pub mod port_repository;
pub mod seasonality_repository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Database connection pool
pub type DbPool = SqlitePool;

/// Database initialization error
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Query error: {0}")]
    QueryError(String),
}

/// Initialize the database connection pool
///
/// # Arguments
/// - `database_url`: SQLite URL (e.g., "sqlite://data/freight_rates.db" or "sqlite::memory:")
///
/// # Errors
/// Returns error if database connection fails or migrations fail
pub async fn init_database(database_url: &str) -> Result<DbPool, DatabaseError> {
    info!("Initializing database: {}", database_url);

    let in_memory = database_url.contains(":memory:");

    if !in_memory {
        if let Some(db_path) = database_url.strip_prefix("sqlite://") {
            if let Some(parent) = Path::new(db_path).parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::ConnectionError(sqlx::Error::Configuration(Box::new(e)))
                })?;
            }
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .log_statements(tracing::log::LevelFilter::Debug);

    // Every connection to ":memory:" is a separate database
    let pool = SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 5 })
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    info!("✓ Database initialized successfully");

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), DatabaseError> {
    info!("Running database migrations...");

    let tables: [(&str, &str); 5] = [
        (
            "ports",
            r#"
            CREATE TABLE IF NOT EXISTS ports (
                id TEXT PRIMARY KEY,
                code TEXT UNIQUE,
                name TEXT,
                region TEXT NOT NULL,
                latitude REAL,
                longitude REAL,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        ),
        (
            "index_values",
            r#"
            CREATE TABLE IF NOT EXISTS index_values (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                index_code TEXT NOT NULL,
                value REAL NOT NULL,
                change REAL,
                index_date DATE NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        ),
        (
            "seasonality_factors",
            r#"
            CREATE TABLE IF NOT EXISTS seasonality_factors (
                origin_region TEXT NOT NULL,
                destination_region TEXT NOT NULL,
                month INTEGER NOT NULL CHECK(month BETWEEN 1 AND 12),
                factor REAL NOT NULL,
                confidence REAL NOT NULL DEFAULT 0.5,
                PRIMARY KEY (origin_region, destination_region, month)
            )
            "#,
        ),
        (
            "fuel_prices",
            r#"
            CREATE TABLE IF NOT EXISTS fuel_prices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fuel_type TEXT NOT NULL,
                price REAL NOT NULL,
                effective_date DATE NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        ),
        (
            "rate_history",
            r#"
            CREATE TABLE IF NOT EXISTS rate_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                origin_port_id TEXT NOT NULL,
                destination_port_id TEXT NOT NULL,
                container_type TEXT NOT NULL,
                weight REAL,
                rate REAL NOT NULL,
                min_rate REAL NOT NULL,
                max_rate REAL NOT NULL,
                fuel_surcharge REAL NOT NULL,
                final_rate REAL NOT NULL,
                reliability REAL NOT NULL,
                source_count INTEGER NOT NULL,
                sources_used TEXT NOT NULL,
                seasonality_factor REAL NOT NULL DEFAULT 1.0,
                fallback BOOLEAN NOT NULL DEFAULT 0,
                error TEXT,
                created_at DATETIME NOT NULL
            )
            "#,
        ),
    ];

    for (name, ddl) in tables {
        sqlx::query(ddl).execute(pool).await.map_err(|e| {
            DatabaseError::MigrationError(format!("Failed to create {} table: {}", name, e))
        })?;
    }

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_index_values_code_date ON index_values(index_code, index_date)",
        "CREATE INDEX IF NOT EXISTS idx_fuel_prices_type_date ON fuel_prices(fuel_type, effective_date)",
        "CREATE INDEX IF NOT EXISTS idx_rate_history_route ON rate_history(origin_port_id, destination_port_id)",
        "CREATE INDEX IF NOT EXISTS idx_rate_history_created_at ON rate_history(created_at)",
    ];

    for ddl in indexes {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;
    }

    info!("✓ Database migrations completed successfully");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_init() {
        let pool = init_database("sqlite::memory:").await;
        assert!(pool.is_ok());
    }

    #[tokio::test]
    async fn test_migrations() {
        let pool = init_database("sqlite::memory:").await.unwrap();

        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('ports', 'index_values', 'seasonality_factors', 'fuel_prices', 'rate_history')"
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(result.0, 5);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        assert!(run_migrations(&pool).await.is_ok());
    }
}
