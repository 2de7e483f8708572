use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::domain::entities::region::Region;
use crate::domain::errors::ProviderError;
use crate::domain::repositories::route_data::{SeasonalityFactor, SeasonalityProvider};

/// Destination value matching any destination region
pub const ANY_DESTINATION: &str = "*";

/// Seasonal factors per lane and month
#[derive(Clone)]
pub struct SqliteSeasonalityRepository {
    pool: SqlitePool,
}

impl SqliteSeasonalityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteSeasonalityRepository { pool }
    }

    /// Insert or replace a factor. `destination: None` stores the wildcard row.
    pub async fn upsert(
        &self,
        origin: Region,
        destination: Option<Region>,
        month: u32,
        factor: SeasonalityFactor,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO seasonality_factors (origin_region, destination_region, month, factor, confidence)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(origin_region, destination_region, month) DO UPDATE SET
                factor = excluded.factor,
                confidence = excluded.confidence
            "#,
        )
        .bind(origin.name())
        .bind(destination.map(|d| d.name()).unwrap_or(ANY_DESTINATION))
        .bind(month as i64)
        .bind(factor.factor)
        .bind(factor.confidence)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn lookup(
        &self,
        origin: &str,
        destination: &str,
        month: u32,
    ) -> Result<Option<SeasonalityFactor>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT factor, confidence
            FROM seasonality_factors
            WHERE origin_region = ? AND destination_region = ? AND month = ?
            "#,
        )
        .bind(origin)
        .bind(destination)
        .bind(month as i64)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| SeasonalityFactor {
            factor: row.get::<f64, _>("factor"),
            confidence: row.get::<f64, _>("confidence"),
        }))
    }
}

#[async_trait]
impl SeasonalityProvider for SqliteSeasonalityRepository {
    async fn factor_for(
        &self,
        origin: Region,
        destination: Region,
        month: u32,
    ) -> Result<Option<SeasonalityFactor>, ProviderError> {
        if !origin.is_known() {
            return Ok(None);
        }

        if destination.is_known() {
            if let Some(factor) = self.lookup(origin.name(), destination.name(), month).await? {
                return Ok(Some(factor));
            }
        }

        let wildcard = self.lookup(origin.name(), ANY_DESTINATION, month).await?;
        if wildcard.is_some() {
            debug!(origin = %origin, destination = %destination, month, "Using wildcard seasonality row");
        }
        Ok(wildcard)
    }
}
