//! horizon-trust server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use horizon_trust::api;
use horizon_trust::app_state::AppState;
use horizon_trust::config::{LogFormat, ServiceConfig};
use horizon_trust::persistence::{CampaignRepository, InMemoryRepository, PostgresRepository};
use horizon_trust::service::{DisabledProcessor, PaymentProcessor, StripeClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config =
        ServiceConfig::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting horizon-trust");

    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET is not set; using the development secret");
    }

    // Build persistence layer
    let repo: Arc<dyn CampaignRepository> = if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .context("connecting to PostgreSQL")?;
        let repo = PostgresRepository::new(pool);
        repo.migrate().await.context("running migrations")?;
        tracing::info!("using PostgreSQL persistence");
        Arc::new(repo)
    } else {
        tracing::warn!("persistence disabled; campaigns are kept in memory");
        Arc::new(InMemoryRepository::new())
    };

    // Payment processor
    let request_timeout = Duration::from_secs(config.request_timeout_secs);
    let payments: Arc<dyn PaymentProcessor> = match &config.stripe_secret_key {
        Some(key) => Arc::new(StripeClient::new(
            config.stripe_api_base.as_str(),
            key.as_str(),
            request_timeout,
        )?),
        None => {
            tracing::warn!("STRIPE_SECRET_KEY is not set; donations are disabled");
            Arc::new(DisabledProcessor)
        }
    };

    if config.stripe_webhook_secret.is_none() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET is not set; payment webhooks are refused");
    }

    // Build application state and router
    let app_state = AppState::build(&config, repo, payments)?;
    let app = api::build_app(app_state, request_timeout);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
