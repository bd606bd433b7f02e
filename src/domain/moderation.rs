//! Moderation decisions and the append-only review history.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{CampaignId, CampaignStatus, UserId};

/// Outcome of one review cycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModerationDecision {
    /// Campaign may go live.
    Approved,
    /// Campaign is refused.
    Rejected,
    /// Screening could not decide; a human must look.
    Review,
    /// Reviewer asked the owner to change the campaign.
    ChangesRequested,
}

impl ModerationDecision {
    /// Status the campaign moves to when this decision is committed.
    #[must_use]
    pub const fn target_status(self) -> CampaignStatus {
        match self {
            Self::Approved => CampaignStatus::Funding,
            Self::Rejected => CampaignStatus::Rejected,
            Self::Review | Self::ChangesRequested => CampaignStatus::PendingReview,
        }
    }

    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Review => "review",
            Self::ChangesRequested => "changes_requested",
        }
    }
}

impl fmt::Display for ModerationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "review" => Ok(Self::Review),
            "changes_requested" => Ok(Self::ChangesRequested),
            other => Err(format!("unknown moderation decision: {other}")),
        }
    }
}

/// A negative content category raised during screening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentFlag {
    /// Luxury spending language.
    Luxury,
    /// Hateful, violent, or illegal-goods language.
    Inappropriate,
    /// Fraud, scam, or urgency-pressure language.
    Suspicious,
}

impl ContentFlag {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Luxury => "luxury",
            Self::Inappropriate => "inappropriate",
            Self::Suspicious => "suspicious",
        }
    }
}

impl FromStr for ContentFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "luxury" => Ok(Self::Luxury),
            "inappropriate" => Ok(Self::Inappropriate),
            "suspicious" => Ok(Self::Suspicious),
            other => Err(format!("unknown content flag: {other}")),
        }
    }
}

/// One entry of a campaign's moderation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ModerationRecord {
    /// Record identifier.
    pub id: uuid::Uuid,
    /// Campaign under review.
    pub campaign_id: CampaignId,
    /// Decision taken.
    pub decision: ModerationDecision,
    /// Trust score at the time of the decision.
    pub score: u8,
    /// Negative content categories raised.
    pub flags: Vec<ContentFlag>,
    /// Reviewer notes.
    pub notes: Option<String>,
    /// Changes the owner must make, for change requests.
    pub required_changes: Vec<String>,
    /// Acting reviewer; `None` for automated screening.
    pub reviewer_id: Option<UserId>,
    /// Decision time.
    pub created_at: DateTime<Utc>,
}

impl ModerationRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(
        campaign_id: CampaignId,
        decision: ModerationDecision,
        score: u8,
        reviewer_id: Option<UserId>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            campaign_id,
            decision,
            score,
            flags: Vec::new(),
            notes: None,
            required_changes: Vec::new(),
            reviewer_id,
            created_at: Utc::now(),
        }
    }

    /// Sets the negative content flags.
    #[must_use]
    pub fn with_flags(mut self, flags: Vec<ContentFlag>) -> Self {
        self.flags = flags;
        self
    }

    /// Sets reviewer notes.
    #[must_use]
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Sets the changes required from the owner.
    #[must_use]
    pub fn with_required_changes(mut self, changes: Vec<String>) -> Self {
        self.required_changes = changes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decisions_map_to_statuses() {
        assert_eq!(
            ModerationDecision::Approved.target_status(),
            CampaignStatus::Funding
        );
        assert_eq!(
            ModerationDecision::Rejected.target_status(),
            CampaignStatus::Rejected
        );
        assert_eq!(
            ModerationDecision::ChangesRequested.target_status(),
            CampaignStatus::PendingReview
        );
    }

    #[test]
    fn decision_serializes_snake_case() {
        let json = serde_json::to_string(&ModerationDecision::ChangesRequested).unwrap_or_default();
        assert_eq!(json, "\"changes_requested\"");
        assert_eq!(
            "changes_requested".parse::<ModerationDecision>(),
            Ok(ModerationDecision::ChangesRequested)
        );
    }

    #[test]
    fn builder_sets_fields() {
        let record = ModerationRecord::new(CampaignId::new(), ModerationDecision::Review, 42, None)
            .with_flags(vec![ContentFlag::Suspicious])
            .with_notes(Some("check the bank details".to_string()));
        assert_eq!(record.flags, vec![ContentFlag::Suspicious]);
        assert_eq!(record.notes.as_deref(), Some("check the bank details"));
        assert!(record.reviewer_id.is_none());
    }
}
