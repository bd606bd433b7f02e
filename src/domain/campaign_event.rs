//! Domain events reflecting campaign state changes.
//!
//! Every committed transition emits a [`CampaignEvent`] through the
//! [`super::EventBus`]. Events are broadcast to WebSocket subscribers;
//! `OwnerNotified` doubles as the notification channel to campaign owners.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{CampaignId, CampaignStatus, ContentFlag, ModerationDecision, UserId};

/// Domain event emitted after every committed mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum CampaignEvent {
    /// Owner submitted the campaign for review.
    CampaignSubmitted {
        /// Campaign identifier.
        campaign_id: CampaignId,
        /// Submission time.
        timestamp: DateTime<Utc>,
    },

    /// Automated screening produced a decision.
    CampaignModerated {
        /// Campaign identifier.
        campaign_id: CampaignId,
        /// Proposed decision.
        decision: ModerationDecision,
        /// Trust score used.
        score: u8,
        /// Negative content categories raised.
        flags: Vec<ContentFlag>,
        /// Screening time.
        timestamp: DateTime<Utc>,
    },

    /// Reviewer approved the campaign.
    CampaignApproved {
        /// Campaign identifier.
        campaign_id: CampaignId,
        /// Acting reviewer, `None` for automated approval.
        reviewer_id: Option<UserId>,
        /// Decision time.
        timestamp: DateTime<Utc>,
    },

    /// Reviewer rejected the campaign.
    CampaignRejected {
        /// Campaign identifier.
        campaign_id: CampaignId,
        /// Acting reviewer, `None` for automated rejection.
        reviewer_id: Option<UserId>,
        /// Decision time.
        timestamp: DateTime<Utc>,
    },

    /// Reviewer asked the owner for changes.
    ChangesRequested {
        /// Campaign identifier.
        campaign_id: CampaignId,
        /// Acting reviewer.
        reviewer_id: UserId,
        /// Number of changes requested. The list itself is sent to the
        /// owner only.
        change_count: usize,
        /// Request time.
        timestamp: DateTime<Utc>,
    },

    /// The cached trust score changed.
    TrustScoreUpdated {
        /// Campaign identifier.
        campaign_id: CampaignId,
        /// Previous score.
        previous_score: u8,
        /// New score.
        new_score: u8,
        /// Reason tag.
        reason: String,
        /// Update time.
        timestamp: DateTime<Utc>,
    },

    /// A payment was confirmed.
    DonationConfirmed {
        /// Campaign identifier.
        campaign_id: CampaignId,
        /// Donation amount in minor units.
        amount: i64,
        /// Total raised after the donation.
        raised_amount: i64,
        /// Campaign status after the donation.
        status: CampaignStatus,
        /// Confirmation time.
        timestamp: DateTime<Utc>,
    },

    /// A message addressed to the campaign owner.
    OwnerNotified {
        /// Campaign identifier.
        campaign_id: CampaignId,
        /// Recipient of the notification.
        owner_id: UserId,
        /// Human-readable message.
        message: String,
        /// Notification time.
        timestamp: DateTime<Utc>,
    },
}

impl CampaignEvent {
    /// Returns the campaign ID associated with this event.
    #[must_use]
    pub fn campaign_id(&self) -> CampaignId {
        match self {
            Self::CampaignSubmitted { campaign_id, .. }
            | Self::CampaignModerated { campaign_id, .. }
            | Self::CampaignApproved { campaign_id, .. }
            | Self::CampaignRejected { campaign_id, .. }
            | Self::ChangesRequested { campaign_id, .. }
            | Self::TrustScoreUpdated { campaign_id, .. }
            | Self::DonationConfirmed { campaign_id, .. }
            | Self::OwnerNotified { campaign_id, .. } => *campaign_id,
        }
    }

    /// Whether a stream opened by `viewer` may receive this event.
    ///
    /// Owner notifications go to the owner only; every other event is public.
    #[must_use]
    pub fn visible_to(&self, viewer: Option<UserId>) -> bool {
        match self {
            Self::OwnerNotified { owner_id, .. } => viewer == Some(*owner_id),
            _ => true,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::CampaignSubmitted { .. } => "campaign_submitted",
            Self::CampaignModerated { .. } => "campaign_moderated",
            Self::CampaignApproved { .. } => "campaign_approved",
            Self::CampaignRejected { .. } => "campaign_rejected",
            Self::ChangesRequested { .. } => "changes_requested",
            Self::TrustScoreUpdated { .. } => "trust_score_updated",
            Self::DonationConfirmed { .. } => "donation_confirmed",
            Self::OwnerNotified { .. } => "owner_notified",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_notices_are_private() {
        let owner = UserId::new();
        let notice = CampaignEvent::OwnerNotified {
            campaign_id: CampaignId::new(),
            owner_id: owner,
            message: "Changes were requested".to_string(),
            timestamp: Utc::now(),
        };
        assert!(notice.visible_to(Some(owner)));
        assert!(!notice.visible_to(Some(UserId::new())));
        assert!(!notice.visible_to(None));

        let public = CampaignEvent::CampaignSubmitted {
            campaign_id: CampaignId::new(),
            timestamp: Utc::now(),
        };
        assert!(public.visible_to(None));
    }

    #[test]
    fn submitted_event_type() {
        let event = CampaignEvent::CampaignSubmitted {
            campaign_id: CampaignId::new(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type_str(), "campaign_submitted");
    }

    #[test]
    fn moderated_event_serializes_tagged() {
        let event = CampaignEvent::CampaignModerated {
            campaign_id: CampaignId::new(),
            decision: ModerationDecision::Review,
            score: 48,
            flags: vec![ContentFlag::Luxury],
            timestamp: Utc::now(),
        };
        let json_str = serde_json::to_string(&event).unwrap_or_default();
        assert!(json_str.contains("\"event_type\":\"campaign_moderated\""));
        assert!(json_str.contains("\"decision\":\"review\""));
        assert!(json_str.contains("luxury"));
    }

    #[test]
    fn campaign_id_accessor() {
        let id = CampaignId::new();
        let event = CampaignEvent::OwnerNotified {
            campaign_id: id,
            owner_id: UserId::new(),
            message: "hello".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.campaign_id(), id);
    }
}
