//! Route data collaborators: port regions, seasonality and fuel surcharge.
//!
//! All three are consulted by the engine on a best-effort basis. An `Err` or
//! `Ok(None)` is always treated as "no information" and never aborts an
//! estimate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::entities::container::ContainerType;
use crate::domain::entities::region::Region;
use crate::domain::errors::ProviderError;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Persisted port-to-region lookup
#[async_trait]
pub trait PortRegionLookup: Send + Sync {
    /// `Ok(None)` when the port is not in the store
    async fn region_of(&self, port_id: &str) -> ProviderResult<Option<Region>>;
}

/// Multiplicative seasonal adjustment for a lane and month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityFactor {
    pub factor: f64,
    pub confidence: f64,
}

#[async_trait]
pub trait SeasonalityProvider: Send + Sync {
    async fn factor_for(
        &self,
        origin: Region,
        destination: Region,
        month: u32,
    ) -> ProviderResult<Option<SeasonalityFactor>>;
}

/// Additive bunker surcharge for a route and container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelSurcharge {
    pub surcharge: f64,
    pub fuel_price: f64,
    pub fuel_type: String,
}

#[async_trait]
pub trait FuelSurchargeCalculator: Send + Sync {
    async fn surcharge_for(
        &self,
        origin_port_id: &str,
        destination_port_id: &str,
        container_type: ContainerType,
    ) -> ProviderResult<Option<FuelSurcharge>>;
}

/// Seasonality provider that always answers "no adjustment"
pub struct NoSeasonality;

#[async_trait]
impl SeasonalityProvider for NoSeasonality {
    async fn factor_for(
        &self,
        _origin: Region,
        _destination: Region,
        _month: u32,
    ) -> ProviderResult<Option<SeasonalityFactor>> {
        Ok(None)
    }
}

/// Fuel calculator that never adds a surcharge
pub struct NoFuelSurcharge;

#[async_trait]
impl FuelSurchargeCalculator for NoFuelSurcharge {
    async fn surcharge_for(
        &self,
        _origin_port_id: &str,
        _destination_port_id: &str,
        _container_type: ContainerType,
    ) -> ProviderResult<Option<FuelSurcharge>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_neutral_providers_return_nothing() {
        assert_eq!(
            NoSeasonality.factor_for(Region::Asia, Region::Europe, 3).await,
            Ok(None)
        );
        assert_eq!(
            NoFuelSurcharge
                .surcharge_for("CNSHA", "NLRTM", ContainerType::Dry40)
                .await,
            Ok(None)
        );
    }
}
