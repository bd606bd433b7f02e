//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::api::signature::WebhookVerifier;
use crate::config::ServiceConfig;
use crate::content::{ContentChecker, KeywordLists};
use crate::domain::EventBus;
use crate::error::ServiceError;
use crate::persistence::CampaignRepository;
use crate::service::{
    BusNotifier, DonationService, ModerationService, PaymentProcessor, TrustService,
};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Campaign lifecycle and moderation.
    pub moderation: Arc<ModerationService>,
    /// Trust scoring.
    pub trust: Arc<TrustService>,
    /// Donations and payments.
    pub donations: Arc<DonationService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// HMAC secret for access tokens.
    pub jwt_secret: Arc<str>,
    /// Payment webhook verifier; `None` refuses every webhook.
    pub webhook: Option<WebhookVerifier>,
}

impl AppState {
    /// Wires every service over `repo` and `payments`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Internal`] if the keyword lists fail to
    /// compile.
    pub fn build(
        config: &ServiceConfig,
        repo: Arc<dyn CampaignRepository>,
        payments: Arc<dyn PaymentProcessor>,
    ) -> Result<Self, ServiceError> {
        let event_bus = EventBus::new(config.event_bus_capacity);
        let checker = ContentChecker::new(&KeywordLists::default())
            .map_err(|e| ServiceError::Internal(format!("keyword lists: {e}")))?;

        let trust = TrustService::new(
            Arc::clone(&repo),
            config.trust_weights.clone(),
            config.retry,
            event_bus.clone(),
        );
        let moderation = ModerationService::new(
            Arc::clone(&repo),
            trust.clone(),
            Arc::new(checker),
            config.moderation,
            Arc::new(BusNotifier::new(event_bus.clone())),
            event_bus.clone(),
            config.retry,
        );
        let donations = DonationService::new(
            repo,
            trust.clone(),
            payments,
            event_bus.clone(),
            config.retry,
            std::time::Duration::from_secs(config.donation_pending_ttl_secs),
        );

        Ok(Self {
            moderation: Arc::new(moderation),
            trust: Arc::new(trust),
            donations: Arc::new(donations),
            event_bus,
            jwt_secret: Arc::from(config.jwt_secret.as_str()),
            webhook: config
                .stripe_webhook_secret
                .as_deref()
                .map(|secret| WebhookVerifier::new(secret, config.webhook_tolerance_secs)),
        })
    }
}
