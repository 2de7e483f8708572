use crate::config::FuelModelConfig;
use crate::domain::entities::container::ContainerType;

const EARTH_RADIUS_NM: f64 = 3440.065;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Great-circle distance in nautical miles (haversine)
pub fn great_circle_nm(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_NM * a.sqrt().asin()
}

/// Bunker surcharge for one container over `sailing_nm` at `fuel_price` per tonne
pub fn surcharge(
    model: &FuelModelConfig,
    sailing_nm: f64,
    fuel_price: f64,
    container_type: ContainerType,
) -> f64 {
    let mut tonnes = sailing_nm / 1000.0 * model.tonnes_per_teu_per_1000nm * container_type.teu();
    if container_type.is_reefer() {
        tonnes *= model.reefer_multiplier;
    }
    (tonnes * fuel_price).max(0.0)
}
