//! Bearer-token authentication.
//!
//! Access tokens are HS256 JWTs carrying the user id and platform role.
//! Handlers take an [`Actor`] (required) or `Option<Actor>` (guest
//! allowed) argument.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::domain::{Actor, Role, UserId};
use crate::error::ServiceError;

/// Token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: uuid::Uuid,
    /// Platform role.
    pub role: Role,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Signs an access token for `actor` valid for `ttl`.
///
/// # Errors
///
/// Returns [`ServiceError::Internal`] if signing fails.
pub fn issue_token(secret: &str, actor: &Actor, ttl: Duration) -> Result<String, ServiceError> {
    let claims = Claims {
        sub: *actor.user_id.as_uuid(),
        role: actor.role,
        exp: (Utc::now() + ttl).timestamp(),
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ServiceError::Internal(e.to_string()))
}

/// Verifies `token` and returns the actor it names.
///
/// # Errors
///
/// Returns [`ServiceError::Unauthenticated`] for a bad signature, an
/// expired token, or malformed claims.
pub fn verify_token(secret: &str, token: &str) -> Result<Actor, ServiceError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected access token");
        ServiceError::Unauthenticated
    })?;
    Ok(Actor::new(
        UserId::from_uuid(data.claims.sub),
        data.claims.role,
    ))
}

fn bearer(parts: &Parts) -> Result<Option<&str>, ServiceError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| ServiceError::Unauthenticated)?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .ok_or(ServiceError::Unauthenticated)?;
    Ok(Some(token.trim()))
}

impl FromRequestParts<AppState> for Actor {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer(parts)?.ok_or(ServiceError::Unauthenticated)?;
        verify_token(&state.jwt_secret, token)
    }
}

impl OptionalFromRequestParts<AppState> for Actor {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match bearer(parts)? {
            Some(token) => verify_token(&state.jwt_secret, token).map(Some),
            None => Ok(None),
        }
    }
}
