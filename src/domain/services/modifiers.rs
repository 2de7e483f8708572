use std::collections::HashMap;

use crate::domain::entities::catalog::IndexCatalog;
use crate::domain::entities::index::{IndexId, IndexReading, ModifierCategory};

/// Combined adjustment of one modifier category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAdjustment {
    pub category: ModifierCategory,
    /// Modifier indices that had a usable reading
    pub indices: Vec<IndexId>,
    /// Product of the per-index factors before clamping
    pub raw_factor: f64,
    /// Factor actually applied, inside `[1 - clamp, 1 + clamp]`
    pub factor: f64,
}

impl CategoryAdjustment {
    pub fn is_neutral(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Compute the multiplicative factor of one category.
///
/// Each available index contributes `1 + weight * (value - baseline) / baseline`,
/// floored at zero so a collapse can never flip sign. The contributions are
/// multiplied together and the product clamped so a single extreme reading
/// cannot dominate the estimate.
pub fn category_factor(
    catalog: &IndexCatalog,
    category: ModifierCategory,
    readings: &HashMap<IndexId, IndexReading>,
    clamp: f64,
) -> CategoryAdjustment {
    let mut indices = Vec::new();
    let mut raw_factor = 1.0;

    for modifier in catalog.modifiers_in(category) {
        let Some(reading) = readings.get(&modifier.index) else {
            continue;
        };
        if !reading.is_usable() || modifier.baseline <= 0.0 {
            continue;
        }

        let deviation = (reading.current_value - modifier.baseline) / modifier.baseline;
        raw_factor *= (1.0 + modifier.weight * deviation).max(0.0);
        indices.push(modifier.index);
    }

    let factor = if raw_factor.is_finite() {
        raw_factor.clamp(1.0 - clamp, 1.0 + clamp)
    } else {
        1.0
    };

    CategoryAdjustment {
        category,
        indices,
        raw_factor,
        factor,
    }
}

/// Weighted average of the running rate (weight 1.0) and the gated index value
pub fn blend_gated(rate: f64, gated_value: f64, gated_weight: f64) -> f64 {
    (rate + gated_value * gated_weight) / (1.0 + gated_weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading(index: IndexId, value: f64) -> (IndexId, IndexReading) {
        (
            index,
            IndexReading::new(index, value, None, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
        )
    }

    #[test]
    fn test_no_readings_is_neutral() {
        let catalog = IndexCatalog::default();
        let adjustment = category_factor(&catalog, ModifierCategory::CharterMarket, &HashMap::new(), 0.2);
        assert!(adjustment.is_neutral());
        assert_eq!(adjustment.factor, 1.0);
    }

    #[test]
    fn test_readings_at_baseline_are_neutral() {
        let catalog = IndexCatalog::default();
        let readings = HashMap::from([
            reading(IndexId::Harpex, 1000.0),
            reading(IndexId::Contex, 700.0),
        ]);
        let adjustment = category_factor(&catalog, ModifierCategory::CharterMarket, &readings, 0.2);
        assert_eq!(adjustment.indices, vec![IndexId::Harpex, IndexId::Contex]);
        assert!((adjustment.factor - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_factor_formula_for_moderate_deviation() {
        let catalog = IndexCatalog::default();
        // HARPEX 10% above baseline with weight 0.3 -> 1.03
        let readings = HashMap::from([reading(IndexId::Harpex, 1100.0)]);
        let adjustment = category_factor(&catalog, ModifierCategory::CharterMarket, &readings, 0.2);
        assert!((adjustment.factor - 1.03).abs() < 1e-12);
        assert_eq!(adjustment.raw_factor, adjustment.factor);
    }

    #[test]
    fn test_extreme_reading_is_clamped() {
        let catalog = IndexCatalog::default();
        let readings = HashMap::from([reading(IndexId::Harpex, 1000.0 * 1000.0)]);
        let charter = category_factor(&catalog, ModifierCategory::CharterMarket, &readings, 0.2);
        assert!(charter.raw_factor > 100.0);
        assert!((charter.factor - 1.2).abs() < 1e-12);

        let readings = HashMap::from([reading(IndexId::Bdi, 1500.0 * 1000.0)]);
        let demand = category_factor(&catalog, ModifierCategory::Demand, &readings, 0.1);
        assert!((demand.factor - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_collapse_is_clamped_from_below() {
        let catalog = IndexCatalog::default();
        let readings = HashMap::from([
            reading(IndexId::Bdi, 1.0),
            reading(IndexId::Lmi, 1.0),
        ]);
        let demand = category_factor(&catalog, ModifierCategory::Demand, &readings, 0.1);
        assert!((demand.factor - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_heavy_weights_cannot_turn_collapse_into_uplift() {
        let mut catalog = IndexCatalog::default();
        for modifier in &mut catalog.modifiers {
            modifier.weight = 3.0;
        }
        assert!(catalog.validate().is_ok());

        // both demand indices 90% below baseline
        let readings = HashMap::from([reading(IndexId::Bdi, 150.0), reading(IndexId::Lmi, 5.5)]);
        let demand = category_factor(&catalog, ModifierCategory::Demand, &readings, 0.1);
        assert_eq!(demand.raw_factor, 0.0);
        assert!((demand.factor - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_other_category_readings_are_ignored() {
        let catalog = IndexCatalog::default();
        let readings = HashMap::from([reading(IndexId::Bdi, 3000.0), reading(IndexId::Scfi, 5000.0)]);
        let charter = category_factor(&catalog, ModifierCategory::CharterMarket, &readings, 0.2);
        assert!(charter.is_neutral());
    }

    #[test]
    fn test_blend_gated() {
        // (1000 * 1.0 + 1600 * 0.5) / 1.5 = 1200
        assert!((blend_gated(1000.0, 1600.0, 0.5) - 1200.0).abs() < 1e-9);
        assert!((blend_gated(1000.0, 1000.0, 0.7) - 1000.0).abs() < 1e-9);
    }
}
