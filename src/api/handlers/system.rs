//! System endpoints: health check and effective configuration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::trust::TrustWeights;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    ws_subscribers: usize,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp, and the number of live event subscribers.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ws_subscribers: state.event_bus.receiver_count(),
        }),
    )
}

/// `GET /config/trust-weights` — Effective trust score weights.
#[utoipa::path(
    get,
    path = "/config/trust-weights",
    tag = "System",
    summary = "Trust score weights",
    description = "Returns the weights the trust calculator runs with, after environment overrides.",
    responses(
        (status = 200, description = "Effective weights", body = TrustWeights),
    )
)]
pub async fn trust_weights_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.trust.weights().clone()))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/trust-weights", get(trust_weights_handler))
}
