//! Database row models and their conversion to domain types.
//!
//! Enum columns are stored as text and JSON-shaped fields as JSONB. A row
//! that fails to convert (unknown status, out-of-range score) surfaces as
//! [`ServiceError::Persistence`].

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::{
    Beneficiary, BudgetItem, Campaign, CampaignId, CampaignUpdate, ContentFlag, Donation,
    MediaItem, ModerationRecord, TrustScoreEvent, UserId,
};
use crate::error::ServiceError;

/// A row from the `campaigns` table.
#[derive(Debug, Clone, FromRow)]
pub struct CampaignRow {
    /// Campaign identifier.
    pub id: Uuid,
    /// Owning user.
    pub owner_id: Uuid,
    /// Status string (e.g. `"PENDING_REVIEW"`).
    pub status: String,
    /// Title.
    pub title: String,
    /// Markdown story.
    pub story_markdown: String,
    /// Category.
    pub category: Option<String>,
    /// Goal in minor units.
    pub goal_amount: i64,
    /// Raised total in minor units.
    pub raised_amount: i64,
    /// ISO currency code.
    pub currency: String,
    /// Cached trust score.
    pub trust_score: i16,
    /// Media attachments.
    pub media: Json<Vec<MediaItem>>,
    /// Budget lines.
    pub budget_breakdown: Json<Vec<BudgetItem>>,
    /// Beneficiaries.
    pub beneficiaries: Json<Vec<Beneficiary>>,
    /// Creator identity verified.
    pub creator_verified: bool,
    /// A reviewer asked for changes.
    pub changes_requested: bool,
    /// Optimistic concurrency version.
    pub version: i64,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Last submission time.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = ServiceError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CampaignId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            status: row.status.parse().map_err(ServiceError::Persistence)?,
            title: row.title,
            story_markdown: row.story_markdown,
            category: row.category,
            goal_amount: row.goal_amount,
            raised_amount: row.raised_amount,
            currency: row.currency,
            trust_score: score_from_column(row.trust_score)?,
            media: row.media.0,
            budget_breakdown: row.budget_breakdown.0,
            beneficiaries: row.beneficiaries.0,
            creator_verified: row.creator_verified,
            changes_requested: row.changes_requested,
            version: row.version,
            created_at: row.created_at,
            submitted_at: row.submitted_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row from the `donations` table.
#[derive(Debug, Clone, FromRow)]
pub struct DonationRow {
    /// Donation identifier.
    pub id: Uuid,
    /// Campaign receiving the donation.
    pub campaign_id: Uuid,
    /// Donor, null once anonymized or for guests.
    pub donor_id: Option<Uuid>,
    /// Donor display name.
    pub donor_name: Option<String>,
    /// Donor email.
    pub donor_email: Option<String>,
    /// Amount in minor units.
    pub amount: i64,
    /// ISO currency code.
    pub currency: String,
    /// Processor payment intent identifier.
    pub payment_intent_id: String,
    /// Payment status string.
    pub payment_status: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DonationRow> for Donation {
    type Error = ServiceError;

    fn try_from(row: DonationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            campaign_id: CampaignId::from_uuid(row.campaign_id),
            donor_id: row.donor_id.map(UserId::from_uuid),
            donor_name: row.donor_name,
            donor_email: row.donor_email,
            amount: row.amount,
            currency: row.currency,
            payment_intent_id: row.payment_intent_id,
            payment_status: row
                .payment_status
                .parse()
                .map_err(ServiceError::Persistence)?,
            created_at: row.created_at,
        })
    }
}

/// A row from the `campaign_updates` table.
#[derive(Debug, Clone, FromRow)]
pub struct UpdateRow {
    /// Update identifier.
    pub id: Uuid,
    /// Campaign the update belongs to.
    pub campaign_id: Uuid,
    /// Headline.
    pub title: String,
    /// Body.
    pub content: String,
    /// Posting time.
    pub created_at: DateTime<Utc>,
}

impl From<UpdateRow> for CampaignUpdate {
    fn from(row: UpdateRow) -> Self {
        Self {
            id: row.id,
            campaign_id: CampaignId::from_uuid(row.campaign_id),
            title: row.title,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// A row from the `campaign_moderation` table.
#[derive(Debug, Clone, FromRow)]
pub struct ModerationRow {
    /// Record identifier.
    pub id: Uuid,
    /// Reviewed campaign.
    pub campaign_id: Uuid,
    /// Decision string.
    pub decision: String,
    /// Trust score at decision time.
    pub score: i16,
    /// Raised content flags.
    pub flags: Json<Vec<ContentFlag>>,
    /// Reviewer notes.
    pub notes: Option<String>,
    /// Changes asked of the owner.
    pub required_changes: Json<Vec<String>>,
    /// Reviewer, null for automated screening.
    pub reviewer_id: Option<Uuid>,
    /// Decision time.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ModerationRow> for ModerationRecord {
    type Error = ServiceError;

    fn try_from(row: ModerationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            campaign_id: CampaignId::from_uuid(row.campaign_id),
            decision: row.decision.parse().map_err(ServiceError::Persistence)?,
            score: score_from_column(row.score)?,
            flags: row.flags.0,
            notes: row.notes,
            required_changes: row.required_changes.0,
            reviewer_id: row.reviewer_id.map(UserId::from_uuid),
            created_at: row.created_at,
        })
    }
}

/// A row from the `trust_score_events` table.
#[derive(Debug, Clone, FromRow)]
pub struct TrustEventRow {
    /// Event identifier.
    pub id: Uuid,
    /// Campaign whose score changed.
    pub campaign_id: Uuid,
    /// Score before.
    pub previous_score: i16,
    /// Score after.
    pub new_score: i16,
    /// Signed difference.
    pub score_change: i16,
    /// Reason tag.
    pub reason: String,
    /// Event time.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TrustEventRow> for TrustScoreEvent {
    type Error = ServiceError;

    fn try_from(row: TrustEventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            campaign_id: CampaignId::from_uuid(row.campaign_id),
            previous_score: score_from_column(row.previous_score)?,
            new_score: score_from_column(row.new_score)?,
            score_change: row.score_change,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}

fn score_from_column(value: i16) -> Result<u8, ServiceError> {
    u8::try_from(value)
        .ok()
        .filter(|s| *s <= crate::trust::MAX_SCORE)
        .ok_or_else(|| ServiceError::Persistence(format!("stored score out of range: {value}")))
}
