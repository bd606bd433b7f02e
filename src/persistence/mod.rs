//! Persistence layer: the campaign repository port and its adapters.
//!
//! [`CampaignRepository`] is the only way services touch storage. Every
//! multi-row change (a review decision plus its history record, a trust
//! score plus its event, a settled donation plus the campaign total) is
//! one repository call so adapters can make it atomic.
//!
//! Status-changing writes are compare-and-swap on [`Campaign::version`]:
//! adapters refuse the write with [`ServiceError::StaleState`] when the
//! stored version differs from the one the caller read.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;

use crate::domain::{
    Campaign, CampaignId, CampaignStatus, CampaignUpdate, Donation, ModerationRecord,
    PaymentStatus, TrustScoreEvent, UserId,
};
use crate::error::ServiceError;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// A committed review decision.
#[derive(Debug, Clone)]
pub struct ReviewCommit<'a> {
    /// Version the reviewer based the decision on.
    pub expected_version: i64,
    /// Status to move to.
    pub new_status: CampaignStatus,
    /// Value of the `changes_requested` flag after the decision.
    pub changes_requested: bool,
    /// History record to append.
    pub record: &'a ModerationRecord,
}

/// Outcome of settling a payment.
#[derive(Debug, Clone)]
pub struct Settlement {
    /// The donation after settlement.
    pub donation: Donation,
    /// The campaign after settlement.
    pub campaign: Campaign,
    /// `false` when the donation was already final and nothing changed.
    pub applied: bool,
}

/// Storage port for campaigns and everything hanging off them.
#[async_trait]
pub trait CampaignRepository: Send + Sync + std::fmt::Debug {
    /// Inserts a new campaign.
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), ServiceError>;

    /// Fetches a campaign.
    ///
    /// Returns [`ServiceError::CampaignNotFound`] when absent.
    async fn get_campaign(&self, id: CampaignId) -> Result<Campaign, ServiceError>;

    /// Overwrites the campaign if the stored version equals
    /// `expected_version`, bumping the version and `updated_at`.
    async fn save_campaign(
        &self,
        campaign: &Campaign,
        expected_version: i64,
    ) -> Result<Campaign, ServiceError>;

    /// Campaigns awaiting review, oldest submission first.
    async fn list_pending_review(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Campaign>, ServiceError>;

    /// Number of campaigns awaiting review.
    async fn count_pending_review(&self) -> Result<u64, ServiceError>;

    /// Applies a review decision and appends its record atomically.
    async fn commit_review(
        &self,
        campaign_id: CampaignId,
        commit: ReviewCommit<'_>,
    ) -> Result<Campaign, ServiceError>;

    /// Appends a record without touching the campaign.
    async fn append_moderation_record(&self, record: &ModerationRecord)
    -> Result<(), ServiceError>;

    /// Review history, newest first.
    async fn moderation_history(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<ModerationRecord>, ServiceError>;

    /// Sets the cached trust score and appends the matching event
    /// atomically. Does not bump the campaign version.
    async fn record_trust_score(
        &self,
        campaign_id: CampaignId,
        new_score: u8,
        reason: &str,
    ) -> Result<(Campaign, TrustScoreEvent), ServiceError>;

    /// Trust score events, newest first.
    async fn trust_score_history(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<TrustScoreEvent>, ServiceError>;

    /// Updates posted for the campaign, oldest first.
    async fn list_updates(&self, campaign_id: CampaignId)
    -> Result<Vec<CampaignUpdate>, ServiceError>;

    /// Stores a new update.
    async fn insert_update(&self, update: &CampaignUpdate) -> Result<(), ServiceError>;

    /// Donations recorded for the campaign, oldest first.
    async fn list_donations(&self, campaign_id: CampaignId)
    -> Result<Vec<Donation>, ServiceError>;

    /// Stores a new pending donation.
    async fn insert_donation(&self, donation: &Donation) -> Result<(), ServiceError>;

    /// Moves a pending donation to `status`. On success the amount is
    /// added to the campaign total and a Funding campaign that reaches its
    /// goal becomes Funded. Already-final donations are returned unchanged
    /// with [`Settlement::applied`] cleared.
    async fn settle_donation(
        &self,
        payment_intent_id: &str,
        status: PaymentStatus,
    ) -> Result<Settlement, ServiceError>;

    /// Nulls the donor fields of every donation made by `donor`.
    async fn anonymize_donor(&self, donor: UserId) -> Result<u64, ServiceError>;
}
