//! Trust score handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::require_reviewer;
use crate::api::dto::{ApiResponse, TrustScoreResponse};
use crate::app_state::AppState;
use crate::domain::trust_event::REASON_RECALCULATED;
use crate::domain::{Actor, CampaignId, TrustScoreEvent};
use crate::error::{ErrorResponse, ServiceError};

/// `GET /campaigns/:id/trust-score` — Current trust score.
///
/// # Errors
///
/// Returns [`ServiceError::CampaignNotFound`] if the campaign does not
/// exist.
#[utoipa::path(
    get,
    path = "/api/v1/campaigns/{id}/trust-score",
    tag = "Trust",
    summary = "Calculate trust score",
    description = "Computes the campaign's trust score from its current state with a per-factor breakdown. Nothing is stored.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    responses(
        (status = 200, description = "Trust score", body = ApiResponse<TrustScoreResponse>),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn get_trust_score(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let campaign_id = CampaignId::from_uuid(id);
    let trust_score = state.trust.calculate_trust_score(campaign_id).await?;
    Ok(Json(ApiResponse::ok(TrustScoreResponse {
        campaign_id,
        trust_score,
    })))
}

/// `POST /campaigns/:id/trust-score/recalculate` — Recalculate and store.
///
/// # Errors
///
/// Returns [`ServiceError::Forbidden`] unless the caller is a reviewer.
#[utoipa::path(
    post,
    path = "/api/v1/campaigns/{id}/trust-score/recalculate",
    tag = "Trust",
    summary = "Recalculate trust score",
    description = "Recomputes the trust score, stores it on the campaign, and appends a history event.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    responses(
        (status = 200, description = "Stored trust score", body = ApiResponse<TrustScoreResponse>),
        (status = 403, description = "Caller is not a reviewer", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn recalculate_trust_score(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    require_reviewer(&actor)?;
    let (campaign, trust_score) = state
        .trust
        .recalculate(CampaignId::from_uuid(id), REASON_RECALCULATED)
        .await?;
    Ok(Json(ApiResponse::ok(TrustScoreResponse {
        campaign_id: campaign.id,
        trust_score,
    })))
}

/// `GET /campaigns/:id/trust-score/history` — Trust score events.
///
/// # Errors
///
/// Returns [`ServiceError::CampaignNotFound`] if the campaign does not
/// exist.
#[utoipa::path(
    get,
    path = "/api/v1/campaigns/{id}/trust-score/history",
    tag = "Trust",
    summary = "Trust score history",
    description = "Returns every stored trust score change, newest first.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    responses(
        (status = 200, description = "Trust score events", body = ApiResponse<Vec<TrustScoreEvent>>),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn trust_score_history(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let events = state
        .trust
        .get_trust_score_history(CampaignId::from_uuid(id))
        .await?;
    Ok(Json(ApiResponse::ok(events)))
}

/// Trust score routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/campaigns/{id}/trust-score", get(get_trust_score))
        .route(
            "/campaigns/{id}/trust-score/recalculate",
            post(recalculate_trust_score),
        )
        .route(
            "/campaigns/{id}/trust-score/history",
            get(trust_score_history),
        )
}
