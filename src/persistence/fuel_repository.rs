use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::config::FuelModelConfig;
use crate::domain::entities::container::ContainerType;
use crate::domain::errors::ProviderError;
use crate::domain::repositories::route_data::{FuelSurcharge, FuelSurchargeCalculator};
use crate::domain::services::fuel_model::{great_circle_nm, surcharge};
use crate::persistence::port_repository::SqlitePortRepository;

/// Bunker surcharge from stored port positions and fuel prices
#[derive(Clone)]
pub struct SqliteFuelSurcharge {
    pool: SqlitePool,
    ports: SqlitePortRepository,
    model: FuelModelConfig,
}

impl SqliteFuelSurcharge {
    pub fn new(pool: SqlitePool, model: FuelModelConfig) -> Self {
        SqliteFuelSurcharge {
            ports: SqlitePortRepository::new(pool.clone()),
            pool,
            model,
        }
    }

    pub async fn insert_price(
        &self,
        fuel_type: &str,
        price: f64,
        effective_date: NaiveDate,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO fuel_prices (fuel_type, price, effective_date) VALUES (?, ?, ?)")
            .bind(fuel_type.to_uppercase())
            .bind(price)
            .bind(effective_date)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Most recent price per tonne for the configured fuel type
    pub async fn latest_price(&self) -> Result<Option<f64>, ProviderError> {
        let price = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT price FROM fuel_prices
            WHERE fuel_type = ?
            ORDER BY effective_date DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(self.model.fuel_type.to_uppercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(price)
    }
}

#[async_trait]
impl FuelSurchargeCalculator for SqliteFuelSurcharge {
    async fn surcharge_for(
        &self,
        origin_port_id: &str,
        destination_port_id: &str,
        container_type: ContainerType,
    ) -> Result<Option<FuelSurcharge>, ProviderError> {
        let (origin, destination, price) = tokio::try_join!(
            self.ports.coordinates_of(origin_port_id),
            self.ports.coordinates_of(destination_port_id),
            self.latest_price(),
        )?;

        let (Some(origin), Some(destination), Some(fuel_price)) = (origin, destination, price) else {
            debug!(
                origin = %origin_port_id,
                destination = %destination_port_id,
                "Missing port position or fuel price, no surcharge"
            );
            return Ok(None);
        };

        let sailing_nm = great_circle_nm(origin, destination) * self.model.routing_factor;
        let amount = surcharge(&self.model, sailing_nm, fuel_price, container_type);
        debug!(sailing_nm, fuel_price, surcharge = amount, "Computed fuel surcharge");

        Ok(Some(FuelSurcharge {
            surcharge: amount,
            fuel_price,
            fuel_type: self.model.fuel_type.clone(),
        }))
    }
}
