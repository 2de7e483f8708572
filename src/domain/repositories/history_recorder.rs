use async_trait::async_trait;

use crate::domain::entities::estimate::{RateEstimate, RateRequest};
use crate::domain::errors::ProviderError;

/// Persists computed estimates for audit and seasonality training.
///
/// Called by the caller of the engine after `compute` returns; the engine
/// itself never writes history.
#[async_trait]
pub trait HistoryRecorder: Send + Sync {
    /// Store one estimate and return its row id
    async fn record(&self, request: &RateRequest, estimate: &RateEstimate) -> Result<i64, ProviderError>;
}
