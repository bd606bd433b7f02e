//! Append-only log of trust score changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::CampaignId;

/// Reason tag recorded when a score is recomputed after moderation screening.
pub const REASON_MODERATION_SCREENING: &str = "moderation_screening";
/// Reason tag recorded after an administrator verifies the creator.
pub const REASON_VERIFICATION_COMPLETED: &str = "verification_completed";
/// Reason tag recorded after the owner posts an update.
pub const REASON_UPDATE_POSTED: &str = "update_posted";
/// Reason tag recorded after a donation is confirmed.
pub const REASON_DONATION_RECEIVED: &str = "donation_received";
/// Reason tag for an explicit recalculation request.
pub const REASON_RECALCULATED: &str = "recalculated";

/// A single change of a campaign's trust score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TrustScoreEvent {
    /// Event identifier.
    pub id: uuid::Uuid,
    /// Campaign whose score changed.
    pub campaign_id: CampaignId,
    /// Score before the change.
    pub previous_score: u8,
    /// Score after the change.
    pub new_score: u8,
    /// Signed difference `new_score - previous_score`.
    pub score_change: i16,
    /// Human-readable reason tag, e.g. `verification_completed`.
    pub reason: String,
    /// Time of the change.
    pub created_at: DateTime<Utc>,
}

impl TrustScoreEvent {
    /// Creates an event for a move from `previous_score` to `new_score`.
    #[must_use]
    pub fn new(campaign_id: CampaignId, previous_score: u8, new_score: u8, reason: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            campaign_id,
            previous_score,
            new_score,
            score_change: i16::from(new_score) - i16::from(previous_score),
            reason: reason.to_string(),
            created_at: Utc::now(),
        }
    }
}
