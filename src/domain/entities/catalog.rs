//! Index Catalog
//!
//! Static classification of every consumed index into core indices (averaged
//! into the base ocean-freight rate) and modifier indices (multiplicative
//! adjustments around a neutral baseline), plus one region-gated index that
//! is blended in only on intra-Asia routes.
//!
//! The catalog is configuration, not state: it is built once, validated, and
//! shared read-only by the engine. A JSON file can replace the defaults.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::entities::index::{IndexId, ModifierCategory};
use crate::domain::entities::region::{Region, RegionGate};
use crate::domain::errors::ConfigError;

/// Core index with its relative weight in the base-rate mean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreIndex {
    pub index: IndexId,
    pub weight: f64,
}

/// Modifier index. `baseline` is the long-run neutral level of the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierIndex {
    pub index: IndexId,
    pub category: ModifierCategory,
    pub weight: f64,
    pub baseline: f64,
}

/// Index blended into the rate only when both route ends pass the gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatedIndex {
    pub index: IndexId,
    pub weight: f64,
    pub gate: RegionGate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexCatalog {
    pub version: u32,
    pub core: Vec<CoreIndex>,
    pub modifiers: Vec<ModifierIndex>,
    pub gated: Option<GatedIndex>,
}

impl Default for IndexCatalog {
    fn default() -> Self {
        IndexCatalog {
            version: 1,
            core: vec![
                CoreIndex { index: IndexId::Scfi, weight: 1.2 },
                CoreIndex { index: IndexId::Ccfi, weight: 1.0 },
                CoreIndex { index: IndexId::Wci, weight: 1.1 },
                CoreIndex { index: IndexId::Fbx, weight: 1.0 },
            ],
            modifiers: vec![
                ModifierIndex {
                    index: IndexId::Harpex,
                    category: ModifierCategory::CharterMarket,
                    weight: 0.3,
                    baseline: 1000.0,
                },
                ModifierIndex {
                    index: IndexId::Contex,
                    category: ModifierCategory::CharterMarket,
                    weight: 0.3,
                    baseline: 700.0,
                },
                ModifierIndex {
                    index: IndexId::Bdi,
                    category: ModifierCategory::Demand,
                    weight: 0.15,
                    baseline: 1500.0,
                },
                ModifierIndex {
                    index: IndexId::Lmi,
                    category: ModifierCategory::Demand,
                    weight: 0.2,
                    baseline: 55.0,
                },
            ],
            gated: Some(GatedIndex {
                index: IndexId::Iacfi,
                weight: 0.5,
                gate: RegionGate::new(vec![Region::Asia, Region::China]),
            }),
        }
    }
}

impl IndexCatalog {
    /// Load a catalog from a JSON file and validate it
    pub fn from_json_file(path: &Path) -> Result<IndexCatalog, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<IndexCatalog, ConfigError> {
        let catalog: IndexCatalog =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Every index the catalog expects a source for, core first
    pub fn all_indices(&self) -> Vec<IndexId> {
        self.core
            .iter()
            .map(|c| c.index)
            .chain(self.modifiers.iter().map(|m| m.index))
            .chain(self.gated.iter().map(|g| g.index))
            .collect()
    }

    pub fn modifiers_in(&self, category: ModifierCategory) -> impl Iterator<Item = &ModifierIndex> {
        self.modifiers.iter().filter(move |m| m.category == category)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for index in self.all_indices() {
            if !seen.insert(index) {
                return Err(ConfigError::DuplicateIndex(index));
            }
        }

        for core in &self.core {
            check_weight(core.index, core.weight)?;
        }

        for modifier in &self.modifiers {
            check_weight(modifier.index, modifier.weight)?;
            if !modifier.baseline.is_finite() || modifier.baseline <= 0.0 {
                return Err(ConfigError::InvalidBaseline {
                    index: modifier.index,
                    baseline: modifier.baseline,
                });
            }
        }

        if let Some(gated) = &self.gated {
            check_weight(gated.index, gated.weight)?;
            if gated.gate.regions.is_empty() {
                return Err(ConfigError::InvalidGate(format!(
                    "gate for {} lists no regions",
                    gated.index
                )));
            }
            if gated.gate.regions.contains(&Region::Unknown) {
                return Err(ConfigError::InvalidGate(format!(
                    "gate for {} must not include the Unknown region",
                    gated.index
                )));
            }
        }

        Ok(())
    }
}

fn check_weight(index: IndexId, weight: f64) -> Result<(), ConfigError> {
    if weight.is_finite() && weight > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeight { index, weight })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = IndexCatalog::default();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.all_indices().len(), 9);
    }

    #[test]
    fn test_modifiers_grouped_by_category() {
        let catalog = IndexCatalog::default();
        let charter: Vec<IndexId> = catalog
            .modifiers_in(ModifierCategory::CharterMarket)
            .map(|m| m.index)
            .collect();
        assert_eq!(charter, vec![IndexId::Harpex, IndexId::Contex]);
        assert_eq!(catalog.modifiers_in(ModifierCategory::Demand).count(), 2);
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let mut catalog = IndexCatalog::default();
        catalog.core.push(CoreIndex { index: IndexId::Harpex, weight: 1.0 });
        assert_eq!(
            catalog.validate(),
            Err(ConfigError::DuplicateIndex(IndexId::Harpex))
        );
    }

    #[test]
    fn test_invalid_weight_and_baseline_rejected() {
        let mut catalog = IndexCatalog::default();
        catalog.core[0].weight = 0.0;
        assert!(matches!(
            catalog.validate(),
            Err(ConfigError::InvalidWeight { index: IndexId::Scfi, .. })
        ));

        let mut catalog = IndexCatalog::default();
        catalog.modifiers[1].baseline = -10.0;
        assert!(matches!(
            catalog.validate(),
            Err(ConfigError::InvalidBaseline { index: IndexId::Contex, .. })
        ));
    }

    #[test]
    fn test_gate_with_unknown_region_rejected() {
        let mut catalog = IndexCatalog::default();
        if let Some(gated) = catalog.gated.as_mut() {
            gated.gate.regions.push(Region::Unknown);
        }
        assert!(matches!(catalog.validate(), Err(ConfigError::InvalidGate(_))));
    }

    #[test]
    fn test_catalog_from_json_overrides_weights() {
        let raw = r#"{
            "version": 7,
            "core": [
                {"index": "SCFI", "weight": 2.0},
                {"index": "CCFI", "weight": 1.0}
            ],
            "modifiers": [
                {"index": "HARPEX", "category": "charter_market", "weight": 0.5, "baseline": 900.0}
            ],
            "gated": null
        }"#;
        let catalog = IndexCatalog::from_json_str(raw).unwrap();
        assert_eq!(catalog.version, 7);
        assert_eq!(catalog.core[0].weight, 2.0);
        assert_eq!(catalog.modifiers[0].baseline, 900.0);
        assert!(catalog.gated.is_none());
    }

    #[test]
    fn test_catalog_from_json_rejects_unknown_index() {
        let raw = r#"{"version": 1, "core": [{"index": "NOPE", "weight": 1.0}], "modifiers": [], "gated": null}"#;
        assert!(matches!(
            IndexCatalog::from_json_str(raw),
            Err(ConfigError::Parse(_))
        ));
    }
}
