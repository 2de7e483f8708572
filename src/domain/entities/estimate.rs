use serde::{Deserialize, Serialize};

use crate::domain::entities::container::ContainerType;
use crate::domain::entities::index::{IndexId, ModifierCategory, Provenance};
use crate::domain::entities::region::Region;

/// Marker reported in `sources_used` when no real core index was available
pub const FALLBACK_SOURCE: &str = "synthetic-fallback";

/// Input of a single rate estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRequest {
    pub origin_port_id: String,
    pub destination_port_id: String,
    pub container_type: ContainerType,
    /// Cargo weight in kilograms. Recorded with the estimate, not priced.
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub debug: bool,
    /// Calendar month (1-12) used for seasonality; current UTC month if absent
    #[serde(default)]
    pub month: Option<u32>,
}

impl RateRequest {
    pub fn new(
        origin_port_id: impl Into<String>,
        destination_port_id: impl Into<String>,
        container_type: ContainerType,
    ) -> Self {
        RateRequest {
            origin_port_id: origin_port_id.into(),
            destination_port_id: destination_port_id.into(),
            container_type,
            weight: None,
            debug: false,
            month: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }
}

/// Outcome of one estimate. Always structurally valid:
/// `min_rate <= rate <= max_rate` and `reliability` lies in the configured band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEstimate {
    /// Ocean-freight rate before fuel surcharge
    pub rate: f64,
    pub min_rate: f64,
    pub max_rate: f64,
    pub fuel_surcharge: f64,
    /// `rate + fuel_surcharge`
    pub final_rate: f64,
    pub reliability: f64,
    /// Number of real index readings that contributed
    pub source_count: usize,
    pub sources_used: Vec<String>,
    pub seasonality_factor: f64,
    /// True when the rate came from the synthetic fallback
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_log: Option<Vec<DebugStep>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Skipped,
    Failed,
    Fallback,
}

/// Weighted core input as used by the base-rate mean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreInput {
    pub index: IndexId,
    pub value: f64,
    pub weight: f64,
}

/// One entry of the debug trace. The trace is descriptive only; values in it
/// are copies of what the engine computed and are never read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum DebugStep {
    SourceFetch {
        index: IndexId,
        status: StepStatus,
        provenance: Option<Provenance>,
        value: Option<f64>,
        error: Option<String>,
    },
    CoreRate {
        inputs: Vec<CoreInput>,
        rate: Option<f64>,
        status: StepStatus,
    },
    Modifier {
        category: ModifierCategory,
        indices: Vec<IndexId>,
        raw_factor: f64,
        factor: f64,
        rate_after: f64,
        status: StepStatus,
    },
    RegionGate {
        index: IndexId,
        origin: Region,
        destination: Region,
        value: Option<f64>,
        rate_after: f64,
        status: StepStatus,
    },
    Seasonality {
        origin: Region,
        destination: Region,
        month: u32,
        factor: f64,
        confidence: Option<f64>,
        status: StepStatus,
        error: Option<String>,
    },
    FuelSurcharge {
        surcharge: f64,
        fuel_price: Option<f64>,
        fuel_type: Option<String>,
        status: StepStatus,
        error: Option<String>,
    },
    Reliability {
        core_sources: usize,
        relative_dispersion: f64,
        reliability: f64,
        status: StepStatus,
    },
    Range {
        spread: f64,
        min_rate: f64,
        max_rate: f64,
        status: StepStatus,
    },
    Fallback {
        reason: String,
        rate: f64,
        status: StepStatus,
    },
}

impl DebugStep {
    pub fn status(&self) -> StepStatus {
        match self {
            DebugStep::SourceFetch { status, .. }
            | DebugStep::CoreRate { status, .. }
            | DebugStep::Modifier { status, .. }
            | DebugStep::RegionGate { status, .. }
            | DebugStep::Seasonality { status, .. }
            | DebugStep::FuelSurcharge { status, .. }
            | DebugStep::Reliability { status, .. }
            | DebugStep::Range { status, .. }
            | DebugStep::Fallback { status, .. } => *status,
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            DebugStep::SourceFetch { .. } => "source_fetch",
            DebugStep::CoreRate { .. } => "core_rate",
            DebugStep::Modifier { .. } => "modifier",
            DebugStep::RegionGate { .. } => "region_gate",
            DebugStep::Seasonality { .. } => "seasonality",
            DebugStep::FuelSurcharge { .. } => "fuel_surcharge",
            DebugStep::Reliability { .. } => "reliability",
            DebugStep::Range { .. } => "range",
            DebugStep::Fallback { .. } => "fallback",
        }
    }
}
