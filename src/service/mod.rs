//! Service layer: business logic orchestration.
//!
//! [`ModerationService`] drives the campaign lifecycle, [`TrustService`]
//! owns trust scoring, and [`DonationService`] handles payments. Each
//! reaches storage only through [`crate::persistence::CampaignRepository`]
//! and emits events through the [`super::domain::EventBus`].

pub mod donation_service;
pub mod moderation_service;
pub mod notifier;
pub mod payment;
pub mod policy;
pub mod retry;
pub mod trust_service;

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod fixtures;

pub use donation_service::{DonationIntent, DonationRequest, DonationService, PaymentConfirmation};
pub use moderation_service::{ModerationResult, ModerationService, PostedUpdate, QueuePage};
pub use notifier::{BusNotifier, Notifier};
pub use payment::{DisabledProcessor, PaymentIntent, PaymentProcessor, StripeClient};
pub use policy::ModerationPolicy;
pub use retry::RetryPolicy;
pub use trust_service::TrustService;
