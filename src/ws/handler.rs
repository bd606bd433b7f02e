//! Axum WebSocket upgrade handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use super::connection::run_connection;
use crate::api::auth::verify_token;
use crate::app_state::AppState;
use crate::domain::Actor;
use crate::error::ServiceError;

/// Optional credentials for clients that cannot set headers on the
/// upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct WsAuth {
    /// Access token, same as the bearer token.
    pub token: Option<String>,
}

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// Anonymous streams receive public campaign events. A stream opened with
/// a bearer header or `?token=` also receives owner notifications for the
/// caller's own campaigns.
///
/// The event receiver is created before the upgrade so no event
/// committed after the handshake is missed.
///
/// # Errors
///
/// Returns [`ServiceError::Unauthenticated`] for a token that does not
/// verify.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    header_actor: Option<Actor>,
    Query(auth): Query<WsAuth>,
) -> Result<impl IntoResponse, ServiceError> {
    let actor = match (header_actor, auth.token.as_deref()) {
        (Some(actor), _) => Some(actor),
        (None, Some(token)) => Some(verify_token(&state.jwt_secret, token)?),
        (None, None) => None,
    };
    let viewer = actor.map(|a| a.user_id);
    let event_rx = state.event_bus.subscribe();
    Ok(ws.on_upgrade(move |socket| run_connection(socket, event_rx, viewer)))
}
