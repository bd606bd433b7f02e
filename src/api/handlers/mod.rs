//! REST endpoint handlers organized by resource.

pub mod campaigns;
pub mod donations;
pub mod moderation;
pub mod system;
pub mod trust;

use axum::Router;

use crate::app_state::AppState;
use crate::domain::Actor;
use crate::error::ServiceError;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(campaigns::routes())
        .merge(moderation::routes())
        .merge(trust::routes())
        .merge(donations::routes())
}

/// Refuses callers that are neither moderators nor admins.
fn require_reviewer(actor: &Actor) -> Result<(), ServiceError> {
    if actor.is_reviewer() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "moderator or admin role required".to_string(),
        ))
    }
}
