use std::time::Duration;

use thiserror::Error;

use crate::domain::entities::index::IndexId;

/// Failure of a single index source adapter.
///
/// Every variant is absorbed by the engine: the source simply contributes
/// nothing to the current estimate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Source timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to parse source response: {0}")]
    Parse(String),

    #[error("Source returned no usable value")]
    Empty,

    #[error("Lookup strategy not supported by this source")]
    Unsupported,
}

/// Failure of a region, seasonality, fuel or history collaborator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for ProviderError {
    fn from(e: sqlx::Error) -> Self {
        ProviderError::Database(e.to_string())
    }
}

/// Configuration problems, detected when the engine is assembled.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("No source adapter registered for index {0}")]
    MissingSource(IndexId),

    #[error("Index {0} appears more than once in the catalog")]
    DuplicateIndex(IndexId),

    #[error("Unknown index code: {0}")]
    UnknownIndex(String),

    #[error("Invalid weight {weight} for index {index}")]
    InvalidWeight { index: IndexId, weight: f64 },

    #[error("Invalid baseline {baseline} for index {index}")]
    InvalidBaseline { index: IndexId, baseline: f64 },

    #[error("Invalid region gate: {0}")]
    InvalidGate(String),

    #[error("Invalid band {name}: [{min}, {max}]")]
    InvalidBand { name: String, min: f64, max: f64 },

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: f64 },

    #[error("Failed to read catalog file: {0}")]
    Io(String),

    #[error("Failed to parse catalog file: {0}")]
    Parse(String),

    #[error("Invalid index API URL: {0}")]
    InvalidUrl(String),
}

/// Internal engine failure. Never returned to callers of `compute`; it is
/// converted into a degraded fallback estimate carrying the message.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RateError {
    #[error("Non-finite rate {value} after stage {stage}")]
    NonFiniteRate { stage: &'static str, value: f64 },

    #[error("Engine panicked: {0}")]
    Panicked(String),
}
