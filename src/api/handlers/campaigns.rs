//! Campaign handlers: create, fetch, edit, submit, verify, post updates.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{ApiResponse, PatchCampaignRequest, PostUpdateRequest};
use crate::app_state::AppState;
use crate::domain::{Actor, Campaign, CampaignDraft, CampaignId};
use crate::error::{ErrorResponse, ServiceError};
use crate::service::PostedUpdate;

/// `POST /campaigns` — Create a draft campaign.
///
/// # Errors
///
/// Returns [`ServiceError`] for a missing token or an invalid goal or
/// currency.
#[utoipa::path(
    post,
    path = "/api/v1/campaigns",
    tag = "Campaigns",
    summary = "Create a draft campaign",
    description = "Creates a campaign in `DRAFT` status owned by the caller. Drafts may be edited freely until submitted for review.",
    request_body = CampaignDraft,
    responses(
        (status = 201, description = "Draft created", body = ApiResponse<Campaign>),
        (status = 422, description = "Invalid goal or currency", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_campaign(
    State(state): State<AppState>,
    actor: Actor,
    Json(draft): Json<CampaignDraft>,
) -> Result<impl IntoResponse, ServiceError> {
    let campaign = state.moderation.create_campaign(&actor, draft).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(campaign))))
}

/// `GET /campaigns/:id` — Get a campaign.
///
/// # Errors
///
/// Returns [`ServiceError::CampaignNotFound`] if the campaign does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/campaigns/{id}",
    tag = "Campaigns",
    summary = "Get campaign",
    description = "Returns a campaign with its status, amounts, cached trust score, and version.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    responses(
        (status = 200, description = "Campaign", body = ApiResponse<Campaign>),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let campaign = state
        .moderation
        .get_campaign(CampaignId::from_uuid(id))
        .await?;
    Ok(Json(ApiResponse::ok(campaign)))
}

/// `PATCH /campaigns/:id` — Edit a draft.
///
/// # Errors
///
/// Returns [`ServiceError`] unless the caller owns an editable campaign
/// at the expected version.
#[utoipa::path(
    patch,
    path = "/api/v1/campaigns/{id}",
    tag = "Campaigns",
    summary = "Edit a draft",
    description = "Applies a partial edit. Allowed in `DRAFT`, or in `PENDING_REVIEW` while a change request is outstanding.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    request_body = PatchCampaignRequest,
    responses(
        (status = 200, description = "Campaign after the edit", body = ApiResponse<Campaign>),
        (status = 400, description = "Campaign is locked", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 409, description = "Stale version", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn patch_campaign(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<PatchCampaignRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let campaign = state
        .moderation
        .update_draft(
            &actor,
            CampaignId::from_uuid(id),
            req.patch,
            req.expected_version,
        )
        .await?;
    Ok(Json(ApiResponse::ok(campaign)))
}

/// `POST /campaigns/:id/submit` — Submit for review.
///
/// # Errors
///
/// Returns [`ServiceError::Validation`] listing every unmet requirement.
#[utoipa::path(
    post,
    path = "/api/v1/campaigns/{id}/submit",
    tag = "Campaigns",
    summary = "Submit for review",
    description = "Moves a complete draft to `PENDING_REVIEW`. Every unmet requirement is listed in `error.details`.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    responses(
        (status = 200, description = "Campaign pending review", body = ApiResponse<Campaign>),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 409, description = "Campaign is not a draft", body = ErrorResponse),
        (status = 422, description = "Campaign is incomplete", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn submit_campaign(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let campaign = state
        .moderation
        .submit_campaign(&actor, CampaignId::from_uuid(id))
        .await?;
    Ok(Json(ApiResponse::ok(campaign)))
}

/// `POST /campaigns/:id/verify` — Mark the creator as verified.
///
/// # Errors
///
/// Returns [`ServiceError::Forbidden`] unless the caller is an admin.
#[utoipa::path(
    post,
    path = "/api/v1/campaigns/{id}/verify",
    tag = "Campaigns",
    summary = "Verify creator",
    description = "Marks the campaign owner's identity as verified and recalculates the trust score.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    responses(
        (status = 200, description = "Campaign after verification", body = ApiResponse<Campaign>),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn verify_creator(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let campaign = state
        .moderation
        .verify_creator(&actor, CampaignId::from_uuid(id))
        .await?;
    Ok(Json(ApiResponse::ok(campaign)))
}

/// `POST /campaigns/:id/updates` — Post a progress update.
///
/// # Errors
///
/// Returns [`ServiceError`] unless the caller owns a live campaign.
#[utoipa::path(
    post,
    path = "/api/v1/campaigns/{id}/updates",
    tag = "Campaigns",
    summary = "Post an update",
    description = "Publishes a progress update on a `FUNDING` or `FUNDED` campaign. The response carries the content screening of the update and the new trust score.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    request_body = PostUpdateRequest,
    responses(
        (status = 201, description = "Update stored", body = ApiResponse<PostedUpdate>),
        (status = 400, description = "Campaign is not live", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 422, description = "Empty title or content", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn post_update(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<PostUpdateRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let posted = state
        .moderation
        .post_update(&actor, CampaignId::from_uuid(id), req.title, req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(posted))))
}

/// Campaign routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/campaigns", post(create_campaign))
        .route("/campaigns/{id}", get(get_campaign).patch(patch_campaign))
        .route("/campaigns/{id}/submit", post(submit_campaign))
        .route("/campaigns/{id}/verify", post(verify_creator))
        .route("/campaigns/{id}/updates", post(post_update))
}
