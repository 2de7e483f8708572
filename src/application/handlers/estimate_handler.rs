use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::warn;

use crate::domain::entities::estimate::{RateEstimate, RateRequest};
use crate::domain::repositories::history_recorder::HistoryRecorder;
use crate::domain::services::rate_engine::RateAggregationEngine;
use crate::persistence::history_repository::{RateHistoryRecord, RateHistoryRepository};

const MAX_BODY_BYTES: usize = 16 * 1024;
const DEFAULT_HISTORY_LIMIT: u32 = 20;
const MAX_HISTORY_LIMIT: u32 = 200;

/// Shared state of the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RateAggregationEngine>,
    pub history: Arc<RateHistoryRepository>,
}

/// Query parameters for the history endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// Results to return (default 20, max 200)
    pub limit: Option<u32>,
    /// Restrict to one route; both ends must be given
    pub origin: Option<String>,
    pub destination: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub catalog_version: u32,
    pub indices: usize,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: impl Into<String>) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: error.into() }),
    )
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/rates/estimate", post(estimate_rate))
        .route("/rates/history", get(get_rate_history))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let catalog = &state.engine.config().catalog;
    Json(HealthResponse {
        status: "running".to_string(),
        catalog_version: catalog.version,
        indices: catalog.all_indices().len(),
    })
}

/// Estimate a rate and record it
pub async fn estimate_rate(
    State(state): State<AppState>,
    payload: Result<Json<RateRequest>, JsonRejection>,
) -> Result<Json<RateEstimate>, HandlerError> {
    let Json(request) = payload.map_err(|rejection| bad_request(rejection.body_text()))?;
    validate_request(&request).map_err(bad_request)?;

    let estimate = state.engine.compute(&request).await;

    if let Err(e) = state.history.record(&request, &estimate).await {
        warn!(
            origin = %request.origin_port_id,
            destination = %request.destination_port_id,
            error = %e,
            "Failed to record rate history"
        );
    }

    Ok(Json(estimate))
}

fn validate_request(request: &RateRequest) -> Result<(), String> {
    if request.origin_port_id.trim().is_empty() {
        return Err("origin_port_id must not be empty".to_string());
    }
    if request.destination_port_id.trim().is_empty() {
        return Err("destination_port_id must not be empty".to_string());
    }
    if let Some(month) = request.month {
        if !(1..=12).contains(&month) {
            return Err(format!("month must be between 1 and 12, got {}", month));
        }
    }
    if let Some(weight) = request.weight {
        if !weight.is_finite() || weight < 0.0 {
            return Err(format!("weight must be a non-negative number, got {}", weight));
        }
    }
    Ok(())
}

/// Recent estimates, optionally for one route
pub async fn get_rate_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<RateHistoryRecord>>, HandlerError> {
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT) as i64;

    let result = match (&params.origin, &params.destination) {
        (Some(origin), Some(destination)) => state.history.get_by_route(origin, destination, limit).await,
        (None, None) => state.history.get_recent(limit).await,
        _ => return Err(bad_request("origin and destination must be given together")),
    };

    result.map(Json).map_err(|e| {
        warn!(error = %e, "Failed to read rate history");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "failed to read rate history".to_string(),
            }),
        )
    })
}
