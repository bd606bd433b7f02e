//! Donation handlers: payment intents, processor webhook, donor erasure.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{AnonymizeResponse, ApiResponse, WebhookEvent, WebhookResponse};
use crate::api::signature::SIGNATURE_HEADER;
use crate::app_state::AppState;
use crate::domain::{Actor, CampaignId};
use crate::error::{ErrorResponse, ServiceError};
use crate::service::{DonationIntent, DonationRequest};

/// `POST /campaigns/:id/donations` — Start a donation.
///
/// # Errors
///
/// Returns [`ServiceError`] when the campaign is not funding, the
/// currency differs, the amount would exceed the goal, or the payment
/// processor fails.
#[utoipa::path(
    post,
    path = "/api/v1/campaigns/{id}/donations",
    tag = "Donations",
    summary = "Create donation intent",
    description = "Creates a payment intent with the processor and stores a pending donation. Guests may donate without a token.",
    params(
        ("id" = uuid::Uuid, Path, description = "Campaign UUID"),
    ),
    request_body = DonationRequest,
    responses(
        (status = 201, description = "Pending donation", body = ApiResponse<DonationIntent>),
        (status = 400, description = "Invalid amount or campaign not funding", body = ErrorResponse),
        (status = 422, description = "Currency mismatch or goal exceeded", body = ErrorResponse),
        (status = 502, description = "Payment processor error", body = ErrorResponse),
        (status = 503, description = "Payment processor unavailable", body = ErrorResponse),
    )
)]
pub async fn create_donation(
    State(state): State<AppState>,
    actor: Option<Actor>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<DonationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let intent = state
        .donations
        .create_donation_intent(actor.as_ref(), CampaignId::from_uuid(id), req)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(intent))))
}

/// `POST /payments/webhook` — Payment processor callback.
///
/// # Errors
///
/// Returns [`ServiceError::Unauthenticated`] unless the body carries a
/// valid `Stripe-Signature`, [`ServiceError::InvalidRequest`] for a body
/// that is not an event, [`ServiceError::DonationNotFound`] for an unknown
/// payment intent, and [`ServiceError::GoalExceeded`] if settlement would
/// overfund the campaign.
#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    tag = "Donations",
    summary = "Payment webhook",
    description = "Settles the donation named by a `payment_intent.succeeded` or `payment_intent.payment_failed` event. The raw body must be signed in the `Stripe-Signature` header. Replays are acknowledged without effect and other event types are ignored.",
    params(
        ("Stripe-Signature" = String, Header, description = "`t=<unix>,v1=<hex HMAC-SHA256>`"),
    ),
    request_body = WebhookEvent,
    responses(
        (status = 200, description = "Event accepted", body = WebhookResponse),
        (status = 400, description = "Body is not a webhook event", body = ErrorResponse),
        (status = 401, description = "Missing or invalid signature", body = ErrorResponse),
        (status = 404, description = "Unknown payment intent", body = ErrorResponse),
        (status = 422, description = "Settlement would exceed the goal", body = ErrorResponse),
    )
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    let Some(verifier) = state.webhook.as_ref() else {
        tracing::warn!("webhook refused: no signing secret configured");
        return Err(ServiceError::Unauthenticated);
    };
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    verifier.verify(signature, &body, chrono::Utc::now().timestamp())?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::InvalidRequest(format!("malformed webhook event: {e}")))?;
    let Some(succeeded) = event.outcome() else {
        tracing::debug!(event_type = %event.event_type, "ignoring webhook event");
        return Ok(Json(WebhookResponse {
            received: true,
            applied: false,
        }));
    };
    let confirmation = state
        .donations
        .confirm_payment(&event.data.object.id, succeeded)
        .await?;
    Ok(Json(WebhookResponse {
        received: true,
        applied: confirmation.applied,
    }))
}

/// `POST /account/anonymize` — Erase the caller's donor details.
///
/// # Errors
///
/// Returns [`ServiceError::Unauthenticated`] without a valid token.
#[utoipa::path(
    post,
    path = "/api/v1/account/anonymize",
    tag = "Donations",
    summary = "Anonymize donor",
    description = "Removes the caller's name, email, and account link from every donation they made.",
    responses(
        (status = 200, description = "Donations anonymized", body = ApiResponse<AnonymizeResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn anonymize_account(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<impl IntoResponse, ServiceError> {
    let anonymized = state.donations.anonymize_donor(&actor).await?;
    Ok(Json(ApiResponse::ok(AnonymizeResponse { anonymized })))
}

/// Donation routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/campaigns/{id}/donations", post(create_donation))
        .route("/payments/webhook", post(payment_webhook))
        .route("/account/anonymize", post(anonymize_account))
}
