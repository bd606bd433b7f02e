//! Moderation handlers: automated screening, human decisions, history,
//! review queue, and ad-hoc content checks.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::require_reviewer;
use crate::api::dto::{
    ApiResponse, ChangesRequest, ContentCheckRequest, PaginationParams, QueueResponse,
    ReviewRequest,
};
use crate::app_state::AppState;
use crate::content::ContentCheck;
use crate::domain::{Actor, Campaign, CampaignId, ModerationRecord};
use crate::error::{ErrorResponse, ServiceError};
use crate::service::ModerationResult;

/// `POST /campaigns/:id/moderate` — Run automated screening.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidTransition`] unless the campaign is
/// pending review.
#[utoipa::path(
    post,
    path = "/api/v1/campaigns/{id}/moderate",
    tag = "Moderation",
    summary = "Run automated screening",
    description = "Screens the campaign text, computes and stores its trust score, and records the resulting decision. The decision changes the campaign status only when automatic application is enabled.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    responses(
        (status = 200, description = "Screening result", body = ApiResponse<ModerationResult>),
        (status = 403, description = "Caller is not a reviewer", body = ErrorResponse),
        (status = 409, description = "Campaign is not pending review", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn moderate_campaign(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    require_reviewer(&actor)?;
    let result = state
        .moderation
        .moderate_campaign(CampaignId::from_uuid(id))
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// `POST /campaigns/:id/approve` — Approve a campaign for funding.
///
/// # Errors
///
/// Returns [`ServiceError`] for non-reviewers, campaigns not pending
/// review, and stale versions.
#[utoipa::path(
    post,
    path = "/api/v1/campaigns/{id}/approve",
    tag = "Moderation",
    summary = "Approve campaign",
    description = "Moves a pending campaign to `FUNDING` and notifies the owner.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Approved campaign", body = ApiResponse<Campaign>),
        (status = 403, description = "Caller is not a reviewer", body = ErrorResponse),
        (status = 409, description = "Wrong status or stale version", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn approve_campaign(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let campaign = state
        .moderation
        .approve_campaign(
            &actor,
            CampaignId::from_uuid(id),
            req.notes,
            req.expected_version,
        )
        .await?;
    Ok(Json(ApiResponse::ok(campaign)))
}

/// `POST /campaigns/:id/reject` — Reject a campaign.
///
/// # Errors
///
/// Returns [`ServiceError`] for non-reviewers, campaigns not pending
/// review, and stale versions.
#[utoipa::path(
    post,
    path = "/api/v1/campaigns/{id}/reject",
    tag = "Moderation",
    summary = "Reject campaign",
    description = "Moves a pending campaign to `REJECTED` and notifies the owner.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Rejected campaign", body = ApiResponse<Campaign>),
        (status = 403, description = "Caller is not a reviewer", body = ErrorResponse),
        (status = 409, description = "Wrong status or stale version", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn reject_campaign(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let campaign = state
        .moderation
        .reject_campaign(
            &actor,
            CampaignId::from_uuid(id),
            req.notes,
            req.expected_version,
        )
        .await?;
    Ok(Json(ApiResponse::ok(campaign)))
}

/// `POST /campaigns/:id/request-changes` — Send a campaign back to its owner.
///
/// # Errors
///
/// Returns [`ServiceError`] for non-reviewers, an empty change list,
/// campaigns not pending review, and stale versions.
#[utoipa::path(
    post,
    path = "/api/v1/campaigns/{id}/request-changes",
    tag = "Moderation",
    summary = "Request changes",
    description = "Keeps the campaign in `PENDING_REVIEW`, unlocks it for editing, and sends the owner the list of required changes.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    request_body = ChangesRequest,
    responses(
        (status = 200, description = "Campaign awaiting changes", body = ApiResponse<Campaign>),
        (status = 400, description = "No changes listed", body = ErrorResponse),
        (status = 403, description = "Caller is not a reviewer", body = ErrorResponse),
        (status = 409, description = "Wrong status or stale version", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn request_changes(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<ChangesRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let campaign = state
        .moderation
        .request_changes(
            &actor,
            CampaignId::from_uuid(id),
            req.changes,
            req.notes,
            req.expected_version,
        )
        .await?;
    Ok(Json(ApiResponse::ok(campaign)))
}

/// `GET /campaigns/:id/moderation` — Moderation history, newest first.
///
/// # Errors
///
/// Returns [`ServiceError`] unless the caller is a reviewer or the owner.
#[utoipa::path(
    get,
    path = "/api/v1/campaigns/{id}/moderation",
    tag = "Moderation",
    summary = "Moderation history",
    description = "Returns every automated and human moderation record for the campaign, newest first. Visible to reviewers and the campaign owner.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    responses(
        (status = 200, description = "Moderation records", body = ApiResponse<Vec<ModerationRecord>>),
        (status = 403, description = "Caller may not see the history", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn moderation_history(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = CampaignId::from_uuid(id);
    if !actor.is_reviewer() {
        let campaign = state.moderation.get_campaign(id).await?;
        if campaign.owner_id != actor.user_id {
            return Err(ServiceError::Forbidden(
                "only reviewers and the owner may view moderation history".to_string(),
            ));
        }
    }
    let records = state.moderation.moderation_history(id).await?;
    Ok(Json(ApiResponse::ok(records)))
}

/// `GET /moderation/queue` — Campaigns awaiting review.
///
/// # Errors
///
/// Returns [`ServiceError::Forbidden`] unless the caller is a reviewer.
#[utoipa::path(
    get,
    path = "/api/v1/moderation/queue",
    tag = "Moderation",
    summary = "Review queue",
    description = "Returns campaigns in `PENDING_REVIEW`, oldest submission first.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated review queue", body = QueueResponse),
        (status = 403, description = "Caller is not a reviewer", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn pending_queue(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    require_reviewer(&actor)?;
    let params = params.clamped();
    let page = state
        .moderation
        .pending_queue(params.per_page, params.offset())
        .await?;
    Ok(Json(QueueResponse {
        data: page.campaigns,
        pagination: params.meta(page.total),
    }))
}

/// `POST /content/check` — Screen arbitrary text.
#[utoipa::path(
    post,
    path = "/api/v1/content/check",
    tag = "Moderation",
    summary = "Check content",
    description = "Screens text against the luxury, inappropriate, suspicious, and trust keyword lists. Nothing is stored.",
    request_body = ContentCheckRequest,
    responses(
        (status = 200, description = "Screening result", body = ApiResponse<ContentCheck>),
    )
)]
pub async fn check_content(
    State(state): State<AppState>,
    Json(req): Json<ContentCheckRequest>,
) -> impl IntoResponse {
    Json(ApiResponse::ok(state.moderation.check_content(&req.text)))
}

/// Moderation routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/campaigns/{id}/moderate", post(moderate_campaign))
        .route("/campaigns/{id}/approve", post(approve_campaign))
        .route("/campaigns/{id}/reject", post(reject_campaign))
        .route("/campaigns/{id}/request-changes", post(request_changes))
        .route("/campaigns/{id}/moderation", get(moderation_history))
        .route("/moderation/queue", get(pending_queue))
        .route("/content/check", post(check_content))
}
