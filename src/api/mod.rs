//! REST API layer: authentication, route handlers, DTOs, and router
//! composition.
//!
//! Resource endpoints are mounted under `/api/v1`; health, configuration,
//! the WebSocket stream, and the OpenAPI UI live at the root.

pub mod auth;
pub mod dto;
pub mod handlers;
pub mod signature;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "horizon-trust",
        description = "Campaign moderation, trust scoring, and donations for Blessed Horizon."
    ),
    paths(
        handlers::system::health_handler,
        handlers::system::trust_weights_handler,
        handlers::campaigns::create_campaign,
        handlers::campaigns::get_campaign,
        handlers::campaigns::patch_campaign,
        handlers::campaigns::submit_campaign,
        handlers::campaigns::verify_creator,
        handlers::campaigns::post_update,
        handlers::moderation::moderate_campaign,
        handlers::moderation::approve_campaign,
        handlers::moderation::reject_campaign,
        handlers::moderation::request_changes,
        handlers::moderation::moderation_history,
        handlers::moderation::pending_queue,
        handlers::moderation::check_content,
        handlers::trust::get_trust_score,
        handlers::trust::recalculate_trust_score,
        handlers::trust::trust_score_history,
        handlers::donations::create_donation,
        handlers::donations::payment_webhook,
        handlers::donations::anonymize_account,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "System", description = "Health and configuration"),
        (name = "Campaigns", description = "Campaign drafts and lifecycle"),
        (name = "Moderation", description = "Screening and human review"),
        (name = "Trust", description = "Trust scores"),
        (name = "Donations", description = "Donations and payments"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` JWT security scheme.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::new);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

/// Builds the servable application: REST routes, the `/ws` event
/// stream, and the HTTP middleware stack.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(build_router())
        .route("/ws", get(ws_handler))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
