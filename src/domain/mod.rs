//! Domain layer: campaign model, review history, and event system.
//!
//! This module holds the server-side domain model: identifiers, the
//! campaign lifecycle state machine, donations, moderation records, the
//! trust score event log, and the event bus used to broadcast committed
//! changes.

pub mod actor;
pub mod campaign;
pub mod campaign_event;
pub mod donation;
pub mod event_bus;
pub mod ids;
pub mod moderation;
pub mod trust_event;

pub use actor::{Actor, Role};
pub use campaign::{
    Beneficiary, BudgetItem, Campaign, CampaignDraft, CampaignPatch, CampaignStatus,
    CampaignUpdate, MediaItem, MediaKind, SubmissionRequirement,
};
pub use campaign_event::CampaignEvent;
pub use donation::{Donation, PaymentStatus};
pub use event_bus::EventBus;
pub use ids::{CampaignId, UserId};
pub use moderation::{ContentFlag, ModerationDecision, ModerationRecord};
pub use trust_event::TrustScoreEvent;
