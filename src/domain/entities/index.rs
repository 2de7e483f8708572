use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::errors::ConfigError;

/// Every freight or market index the estimator knows how to consume.
///
/// Sources are keyed by this enum rather than by free-form names, so a
/// misspelled index is rejected when the catalog is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndexId {
    /// Shanghai Containerized Freight Index
    #[serde(rename = "SCFI")]
    Scfi,
    /// China Containerized Freight Index
    #[serde(rename = "CCFI")]
    Ccfi,
    /// Drewry World Container Index
    #[serde(rename = "WCI")]
    Wci,
    /// Freightos Baltic Index
    #[serde(rename = "FBX")]
    Fbx,
    /// Harper Petersen charter rate index
    #[serde(rename = "HARPEX")]
    Harpex,
    /// Hamburg container ship charter index
    #[serde(rename = "CONTEX")]
    Contex,
    /// Baltic Dry Index
    #[serde(rename = "BDI")]
    Bdi,
    /// Logistics Managers' Index
    #[serde(rename = "LMI")]
    Lmi,
    /// Intra-Asia container freight index
    #[serde(rename = "IACFI")]
    Iacfi,
}

impl IndexId {
    pub const ALL: [IndexId; 9] = [
        IndexId::Scfi,
        IndexId::Ccfi,
        IndexId::Wci,
        IndexId::Fbx,
        IndexId::Harpex,
        IndexId::Contex,
        IndexId::Bdi,
        IndexId::Lmi,
        IndexId::Iacfi,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            IndexId::Scfi => "SCFI",
            IndexId::Ccfi => "CCFI",
            IndexId::Wci => "WCI",
            IndexId::Fbx => "FBX",
            IndexId::Harpex => "HARPEX",
            IndexId::Contex => "CONTEX",
            IndexId::Bdi => "BDI",
            IndexId::Lmi => "LMI",
            IndexId::Iacfi => "IACFI",
        }
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for IndexId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        IndexId::ALL
            .into_iter()
            .find(|id| id.code() == upper)
            .ok_or_else(|| ConfigError::UnknownIndex(s.to_string()))
    }
}

/// Modifier sub-categories. Each category produces one clamped factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierCategory {
    CharterMarket,
    Demand,
}

impl ModifierCategory {
    pub fn name(&self) -> &'static str {
        match self {
            ModifierCategory::CharterMarket => "charter-market",
            ModifierCategory::Demand => "demand",
        }
    }
}

/// How a reading was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    Primary,
    FallbackSearch,
}

/// One index value fetched for the current estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexReading {
    pub index: IndexId,
    pub current_value: f64,
    /// Absolute or percentage change as reported by the source, if any
    pub change: Option<f64>,
    pub as_of: NaiveDate,
    pub provenance: Provenance,
}

impl IndexReading {
    pub fn new(index: IndexId, current_value: f64, change: Option<f64>, as_of: NaiveDate) -> Self {
        IndexReading {
            index,
            current_value,
            change,
            as_of,
            provenance: Provenance::Primary,
        }
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// A reading can only be priced if it is a finite, strictly positive number.
    pub fn is_usable(&self) -> bool {
        self.current_value.is_finite() && self.current_value > 0.0
    }
}
