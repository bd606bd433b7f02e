//! DTOs for donation, payment webhook, and account endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Event type sent when a payment completes.
pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
/// Event type sent when a payment fails.
pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";

/// Payment processor webhook event.
///
/// Only the fields needed to settle a donation are read.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WebhookEvent {
    /// Processor event identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Event type, e.g. `payment_intent.succeeded`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload.
    pub data: WebhookData,
}

/// Webhook payload wrapper.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WebhookData {
    /// The object the event is about.
    pub object: WebhookObject,
}

/// The payment intent named by a webhook.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WebhookObject {
    /// Payment intent identifier.
    pub id: String,
}

impl WebhookEvent {
    /// `Some(true)` for a success, `Some(false)` for a failure, and
    /// `None` for event types that do not settle a donation.
    #[must_use]
    pub fn outcome(&self) -> Option<bool> {
        match self.event_type.as_str() {
            PAYMENT_SUCCEEDED => Some(true),
            PAYMENT_FAILED => Some(false),
            _ => None,
        }
    }
}

/// Response body for `POST /payments/webhook`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebhookResponse {
    /// Always `true` once the event was accepted.
    pub received: bool,
    /// `false` for replays and ignored event types.
    pub applied: bool,
}

/// Response body for `POST /account/anonymize`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnonymizeResponse {
    /// Donations whose donor details were removed.
    pub anonymized: u64,
}
