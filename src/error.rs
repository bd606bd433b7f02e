//! Service error types with HTTP status code mapping.
//!
//! [`ServiceError`] is the central error type. Each variant maps to a
//! numeric code, an HTTP status, and a structured JSON body. Server-side
//! failures are logged in full and rendered with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{CampaignId, CampaignStatus};

/// Structured JSON error response body.
///
/// ```json
/// {
///   "success": false,
///   "error": {
///     "code": 1002,
///     "message": "campaign is not ready for submission",
///     "details": ["category must be set"]
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Every individual failure, for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                     |
/// |-----------|-------------------|---------------------------------|
/// | 1000–1099 | Validation        | 400 / 422                       |
/// | 1100–1199 | Authorization     | 401 / 403                       |
/// | 2000–2099 | Not Found         | 404                             |
/// | 2100–2299 | State             | 409 / 422                       |
/// | 3000–3199 | Server / Upstream | 500 / 502 / 503                 |
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// One or more business rules failed; every failure is listed.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Missing or invalid credentials.
    #[error("authentication required")]
    Unauthenticated,

    /// Caller is authenticated but not allowed to act.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Campaign with the given ID was not found.
    #[error("campaign not found: {0}")]
    CampaignNotFound(CampaignId),

    /// Donation (or payment intent) was not found.
    #[error("donation not found: {0}")]
    DonationNotFound(String),

    /// Transition not allowed by the campaign lifecycle.
    #[error("cannot move campaign from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: CampaignStatus,
        /// Requested status.
        to: CampaignStatus,
    },

    /// The campaign changed since the caller read it.
    #[error("stale campaign state: expected version {expected}, found {actual}")]
    StaleState {
        /// Version the caller based the change on.
        expected: i64,
        /// Version currently stored.
        actual: i64,
    },

    /// Donation would push `raised_amount` above `goal_amount`.
    #[error("donation of {amount} exceeds remaining goal of {remaining}")]
    GoalExceeded {
        /// Requested amount.
        amount: i64,
        /// Amount still needed.
        remaining: i64,
    },

    /// Transient upstream failure (connection, timeout). Safe to retry.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Payment processor rejected the call.
    #[error("payment processor error: {0}")]
    Payment(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Validation(_) => 1002,
            Self::Unauthenticated => 1101,
            Self::Forbidden(_) => 1102,
            Self::CampaignNotFound(_) => 2001,
            Self::DonationNotFound(_) => 2002,
            Self::InvalidTransition { .. } => 2101,
            Self::StaleState { .. } => 2102,
            Self::GoalExceeded { .. } => 2201,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::Unavailable(_) => 3002,
            Self::Payment(_) => 3101,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) | Self::GoalExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::CampaignNotFound(_) | Self::DonationNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidTransition { .. } | Self::StaleState { .. } => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` if the operation may succeed when repeated.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Message safe to show to end users.
    fn public_message(&self) -> String {
        match self {
            Self::Validation(_) => "request failed validation".to_string(),
            Self::Unavailable(_) => "service temporarily unavailable, try again".to_string(),
            Self::Payment(_) => "payment could not be processed".to_string(),
            Self::Persistence(_) | Self::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let details = match &self {
            Self::Validation(errors) => Some(errors.clone()),
            _ => None,
        };
        let body = ErrorResponse {
            success: false,
            error: ErrorBody {
                code: self.error_code(),
                message: self.public_message(),
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
