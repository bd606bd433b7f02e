//! Trust service: computes, persists, and audits campaign trust scores.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{Campaign, CampaignEvent, CampaignId, EventBus, TrustScoreEvent};
use crate::error::ServiceError;
use crate::persistence::CampaignRepository;
use crate::service::RetryPolicy;
use crate::trust::{MAX_SCORE, TrustInputs, TrustScore, TrustWeights, compute};

/// Trust score orchestration.
///
/// Calculation reads a snapshot through the repository and hands it to the
/// pure calculator. A failed read fails the whole calculation; no partial
/// score is ever produced.
#[derive(Debug, Clone)]
pub struct TrustService {
    repo: Arc<dyn CampaignRepository>,
    weights: TrustWeights,
    retry: RetryPolicy,
    event_bus: EventBus,
}

impl TrustService {
    /// Creates a new `TrustService`.
    #[must_use]
    pub fn new(
        repo: Arc<dyn CampaignRepository>,
        weights: TrustWeights,
        retry: RetryPolicy,
        event_bus: EventBus,
    ) -> Self {
        Self {
            repo,
            weights,
            retry,
            event_bus,
        }
    }

    /// Effective weights.
    #[must_use]
    pub fn weights(&self) -> &TrustWeights {
        &self.weights
    }

    /// Computes the current score without persisting it.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::CampaignNotFound`] for an unknown campaign,
    /// or the repository error if any input cannot be read.
    pub async fn calculate_trust_score(&self, id: CampaignId) -> Result<TrustScore, ServiceError> {
        let campaign = self.load_campaign(id).await?;
        self.score_of(&campaign).await
    }

    /// Computes the score of an already-loaded campaign.
    pub(crate) async fn score_of(&self, campaign: &Campaign) -> Result<TrustScore, ServiceError> {
        let repo = &self.repo;
        let id = campaign.id;
        let donations = self
            .retry
            .run("list_donations", move || repo.list_donations(id))
            .await?;
        let updates = self
            .retry
            .run("list_updates", move || repo.list_updates(id))
            .await?;

        let inputs = TrustInputs {
            campaign,
            donations: &donations,
            updates: &updates,
        };
        let score = compute(&inputs, &self.weights, Utc::now());
        tracing::debug!(campaign_id = %id, score = score.score, breakdown = ?score.breakdown, "trust score computed");
        Ok(score)
    }

    /// Persists `score` as the cached score and records why.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidRequest`] for a score above 100, or
    /// the repository error.
    pub async fn update_trust_score(
        &self,
        id: CampaignId,
        score: u8,
        reason: &str,
    ) -> Result<Campaign, ServiceError> {
        if score > MAX_SCORE {
            return Err(ServiceError::InvalidRequest(format!(
                "trust score {score} exceeds {MAX_SCORE}"
            )));
        }
        let (campaign, event) = self.repo.record_trust_score(id, score, reason).await?;

        tracing::info!(
            campaign_id = %id,
            previous = event.previous_score,
            new = event.new_score,
            reason,
            "trust score updated"
        );
        let _ = self.event_bus.publish(CampaignEvent::TrustScoreUpdated {
            campaign_id: id,
            previous_score: event.previous_score,
            new_score: event.new_score,
            reason: event.reason,
            timestamp: event.created_at,
        });
        Ok(campaign)
    }

    /// Computes and persists the score in one step.
    ///
    /// # Errors
    ///
    /// Propagates any read or write failure; nothing is written when the
    /// calculation fails.
    pub async fn recalculate(
        &self,
        id: CampaignId,
        reason: &str,
    ) -> Result<(Campaign, TrustScore), ServiceError> {
        let score = self.calculate_trust_score(id).await?;
        let campaign = self.update_trust_score(id, score.score, reason).await?;
        Ok((campaign, score))
    }

    /// Score changes, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::CampaignNotFound`] for an unknown campaign.
    pub async fn get_trust_score_history(
        &self,
        id: CampaignId,
    ) -> Result<Vec<TrustScoreEvent>, ServiceError> {
        self.load_campaign(id).await?;
        let repo = &self.repo;
        self.retry
            .run("trust_score_history", move || repo.trust_score_history(id))
            .await
    }

    async fn load_campaign(&self, id: CampaignId) -> Result<Campaign, ServiceError> {
        let repo = &self.repo;
        self.retry
            .run("get_campaign", move || repo.get_campaign(id))
            .await
    }
}
