//! In-memory repository.
//!
//! All tables live behind a single [`tokio::sync::RwLock`], so every
//! repository call is atomic with respect to every other. Used when
//! persistence is disabled and throughout the test suite.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{CampaignRepository, ReviewCommit, Settlement};
use crate::domain::{
    Campaign, CampaignId, CampaignStatus, CampaignUpdate, Donation, ModerationRecord,
    PaymentStatus, TrustScoreEvent, UserId,
};
use crate::error::ServiceError;

#[derive(Debug, Default)]
struct Tables {
    campaigns: HashMap<CampaignId, Campaign>,
    donations: Vec<Donation>,
    updates: Vec<CampaignUpdate>,
    moderation: Vec<ModerationRecord>,
    trust_events: Vec<TrustScoreEvent>,
}

/// Repository holding everything in process memory.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
    failures: AtomicU32,
    failures_retryable: AtomicBool,
}

impl InMemoryRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` calls fail before touching any table.
    ///
    /// Retryable failures surface as [`ServiceError::Unavailable`], the
    /// others as [`ServiceError::Persistence`].
    pub fn inject_failures(&self, count: u32, retryable: bool) {
        self.failures_retryable.store(retryable, Ordering::SeqCst);
        self.failures.store(count, Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<(), ServiceError> {
        let took = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if took.is_ok() {
            if self.failures_retryable.load(Ordering::SeqCst) {
                return Err(ServiceError::Unavailable("injected connection reset".to_string()));
            }
            return Err(ServiceError::Persistence("injected write failure".to_string()));
        }
        Ok(())
    }
}

fn check_version(stored: &Campaign, expected: i64) -> Result<(), ServiceError> {
    if stored.version != expected {
        return Err(ServiceError::StaleState {
            expected,
            actual: stored.version,
        });
    }
    Ok(())
}

#[async_trait]
impl CampaignRepository for InMemoryRepository {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), ServiceError> {
        self.check_failure()?;
        let mut tables = self.tables.write().await;
        if tables.campaigns.contains_key(&campaign.id) {
            return Err(ServiceError::InvalidRequest(format!(
                "campaign {} already exists",
                campaign.id
            )));
        }
        tables.campaigns.insert(campaign.id, campaign.clone());
        Ok(())
    }

    async fn get_campaign(&self, id: CampaignId) -> Result<Campaign, ServiceError> {
        self.check_failure()?;
        let tables = self.tables.read().await;
        tables
            .campaigns
            .get(&id)
            .cloned()
            .ok_or(ServiceError::CampaignNotFound(id))
    }

    async fn save_campaign(
        &self,
        campaign: &Campaign,
        expected_version: i64,
    ) -> Result<Campaign, ServiceError> {
        self.check_failure()?;
        let mut tables = self.tables.write().await;
        let stored = tables
            .campaigns
            .get_mut(&campaign.id)
            .ok_or(ServiceError::CampaignNotFound(campaign.id))?;
        check_version(stored, expected_version)?;

        let mut next = campaign.clone();
        next.version = expected_version + 1;
        next.updated_at = Utc::now();
        // The cached score is owned by record_trust_score.
        next.trust_score = stored.trust_score;
        *stored = next.clone();
        Ok(next)
    }

    async fn list_pending_review(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Campaign>, ServiceError> {
        self.check_failure()?;
        let tables = self.tables.read().await;
        let mut pending: Vec<Campaign> = tables
            .campaigns
            .values()
            .filter(|c| c.status == CampaignStatus::PendingReview)
            .cloned()
            .collect();
        pending.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(pending
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_pending_review(&self) -> Result<u64, ServiceError> {
        self.check_failure()?;
        let tables = self.tables.read().await;
        let count = tables
            .campaigns
            .values()
            .filter(|c| c.status == CampaignStatus::PendingReview)
            .count();
        Ok(count as u64)
    }

    async fn commit_review(
        &self,
        campaign_id: CampaignId,
        commit: ReviewCommit<'_>,
    ) -> Result<Campaign, ServiceError> {
        self.check_failure()?;
        let mut tables = self.tables.write().await;
        let stored = tables
            .campaigns
            .get_mut(&campaign_id)
            .ok_or(ServiceError::CampaignNotFound(campaign_id))?;
        check_version(stored, commit.expected_version)?;

        stored.status = commit.new_status;
        stored.changes_requested = commit.changes_requested;
        stored.version += 1;
        stored.updated_at = Utc::now();
        let updated = stored.clone();
        tables.moderation.push(commit.record.clone());
        Ok(updated)
    }

    async fn append_moderation_record(
        &self,
        record: &ModerationRecord,
    ) -> Result<(), ServiceError> {
        self.check_failure()?;
        let mut tables = self.tables.write().await;
        if !tables.campaigns.contains_key(&record.campaign_id) {
            return Err(ServiceError::CampaignNotFound(record.campaign_id));
        }
        tables.moderation.push(record.clone());
        Ok(())
    }

    async fn moderation_history(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<ModerationRecord>, ServiceError> {
        self.check_failure()?;
        let tables = self.tables.read().await;
        let mut history: Vec<ModerationRecord> = tables
            .moderation
            .iter()
            .rev()
            .filter(|r| r.campaign_id == campaign_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(history)
    }

    async fn record_trust_score(
        &self,
        campaign_id: CampaignId,
        new_score: u8,
        reason: &str,
    ) -> Result<(Campaign, TrustScoreEvent), ServiceError> {
        self.check_failure()?;
        let mut tables = self.tables.write().await;
        let stored = tables
            .campaigns
            .get_mut(&campaign_id)
            .ok_or(ServiceError::CampaignNotFound(campaign_id))?;
        let event = TrustScoreEvent::new(campaign_id, stored.trust_score, new_score, reason);
        stored.trust_score = new_score;
        let updated = stored.clone();
        tables.trust_events.push(event.clone());
        Ok((updated, event))
    }

    async fn trust_score_history(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<TrustScoreEvent>, ServiceError> {
        self.check_failure()?;
        let tables = self.tables.read().await;
        let mut history: Vec<TrustScoreEvent> = tables
            .trust_events
            .iter()
            .rev()
            .filter(|e| e.campaign_id == campaign_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(history)
    }

    async fn list_updates(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<CampaignUpdate>, ServiceError> {
        self.check_failure()?;
        let tables = self.tables.read().await;
        Ok(tables
            .updates
            .iter()
            .filter(|u| u.campaign_id == campaign_id)
            .cloned()
            .collect())
    }

    async fn insert_update(&self, update: &CampaignUpdate) -> Result<(), ServiceError> {
        self.check_failure()?;
        let mut tables = self.tables.write().await;
        if !tables.campaigns.contains_key(&update.campaign_id) {
            return Err(ServiceError::CampaignNotFound(update.campaign_id));
        }
        tables.updates.push(update.clone());
        Ok(())
    }

    async fn list_donations(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<Donation>, ServiceError> {
        self.check_failure()?;
        let tables = self.tables.read().await;
        Ok(tables
            .donations
            .iter()
            .filter(|d| d.campaign_id == campaign_id)
            .cloned()
            .collect())
    }

    async fn insert_donation(&self, donation: &Donation) -> Result<(), ServiceError> {
        self.check_failure()?;
        let mut tables = self.tables.write().await;
        if !tables.campaigns.contains_key(&donation.campaign_id) {
            return Err(ServiceError::CampaignNotFound(donation.campaign_id));
        }
        if tables
            .donations
            .iter()
            .any(|d| d.payment_intent_id == donation.payment_intent_id)
        {
            return Err(ServiceError::InvalidRequest(format!(
                "payment intent {} already recorded",
                donation.payment_intent_id
            )));
        }
        tables.donations.push(donation.clone());
        Ok(())
    }

    async fn settle_donation(
        &self,
        payment_intent_id: &str,
        status: PaymentStatus,
    ) -> Result<Settlement, ServiceError> {
        self.check_failure()?;
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        let donation = tables
            .donations
            .iter_mut()
            .find(|d| d.payment_intent_id == payment_intent_id)
            .ok_or_else(|| ServiceError::DonationNotFound(payment_intent_id.to_string()))?;
        let campaign = tables
            .campaigns
            .get_mut(&donation.campaign_id)
            .ok_or(ServiceError::CampaignNotFound(donation.campaign_id))?;

        if donation.payment_status.is_final() {
            return Ok(Settlement {
                donation: donation.clone(),
                campaign: campaign.clone(),
                applied: false,
            });
        }

        if status == PaymentStatus::Succeeded {
            let remaining = campaign.remaining_amount();
            if donation.amount > remaining {
                return Err(ServiceError::GoalExceeded {
                    amount: donation.amount,
                    remaining,
                });
            }
            campaign.raised_amount += donation.amount;
            if campaign.status == CampaignStatus::Funding
                && campaign.raised_amount >= campaign.goal_amount
            {
                campaign.status = CampaignStatus::Funded;
            }
            campaign.version += 1;
            campaign.updated_at = Utc::now();
        }
        donation.payment_status = status;

        Ok(Settlement {
            donation: donation.clone(),
            campaign: campaign.clone(),
            applied: true,
        })
    }

    async fn anonymize_donor(&self, donor: UserId) -> Result<u64, ServiceError> {
        self.check_failure()?;
        let mut tables = self.tables.write().await;
        let mut count = 0;
        for donation in tables
            .donations
            .iter_mut()
            .filter(|d| d.donor_id == Some(donor))
        {
            donation.anonymize();
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{CampaignDraft, ModerationDecision};
    use chrono::Duration;

    fn draft() -> Campaign {
        Campaign::new_draft(
            UserId::new(),
            CampaignDraft {
                title: "Roof repairs for the shelter".to_string(),
                story_markdown: String::new(),
                category: None,
                goal_amount: 10_000,
                currency: "usd".to_string(),
                media: Vec::new(),
                budget_breakdown: Vec::new(),
                beneficiaries: Vec::new(),
            },
        )
    }

    fn pending_donation(campaign_id: CampaignId, amount: i64, intent: &str) -> Donation {
        Donation {
            id: uuid::Uuid::new_v4(),
            campaign_id,
            donor_id: None,
            donor_name: None,
            donor_email: None,
            amount,
            currency: "usd".to_string(),
            payment_intent_id: intent.to_string(),
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_and_get() {
        let repo = InMemoryRepository::new();
        let campaign = draft();
        assert!(repo.insert_campaign(&campaign).await.is_ok());
        let Ok(fetched) = repo.get_campaign(campaign.id).await else {
            panic!("campaign not found");
        };
        assert_eq!(fetched, campaign);
    }

    #[tokio::test]
    async fn get_nonexistent_returns_not_found() {
        let repo = InMemoryRepository::new();
        let result = repo.get_campaign(CampaignId::new()).await;
        assert!(matches!(result, Err(ServiceError::CampaignNotFound(_))));
    }

    #[tokio::test]
    async fn save_rejects_stale_version() {
        let repo = InMemoryRepository::new();
        let campaign = draft();
        let _ = repo.insert_campaign(&campaign).await;

        let Ok(saved) = repo.save_campaign(&campaign, 1).await else {
            panic!("first save failed");
        };
        assert_eq!(saved.version, 2);

        let stale = repo.save_campaign(&campaign, 1).await;
        assert!(matches!(
            stale,
            Err(ServiceError::StaleState {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[tokio::test]
    async fn pending_queue_is_fifo_by_submission() {
        let repo = InMemoryRepository::new();
        let base = Utc::now();
        let mut ids = Vec::new();
        // Insert in reverse so insertion order cannot explain the result.
        for offset in [3, 1, 2] {
            let mut c = draft();
            c.status = CampaignStatus::PendingReview;
            c.submitted_at = Some(base + Duration::seconds(offset));
            ids.push((offset, c.id));
            let _ = repo.insert_campaign(&c).await;
        }
        let _ = repo.insert_campaign(&draft()).await;
        ids.sort();

        let Ok(queue) = repo.list_pending_review(10, 0).await else {
            panic!("queue failed");
        };
        let got: Vec<_> = queue.iter().map(|c| c.id).collect();
        let want: Vec<_> = ids.iter().map(|(_, id)| *id).collect();
        assert_eq!(got, want);
        assert_eq!(repo.count_pending_review().await.ok(), Some(3));

        let Ok(page) = repo.list_pending_review(1, 1).await else {
            panic!("page failed");
        };
        assert_eq!(page.first().map(|c| c.id), want.get(1).copied());
    }

    #[tokio::test]
    async fn commit_review_is_atomic_under_stale_version() {
        let repo = InMemoryRepository::new();
        let mut c = draft();
        c.status = CampaignStatus::PendingReview;
        let _ = repo.insert_campaign(&c).await;

        let record = ModerationRecord::new(c.id, ModerationDecision::Approved, 60, None);
        let result = repo
            .commit_review(
                c.id,
                ReviewCommit {
                    expected_version: 7,
                    new_status: CampaignStatus::Funding,
                    changes_requested: false,
                    record: &record,
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::StaleState { .. })));

        let history = repo.moderation_history(c.id).await.unwrap_or_default();
        assert!(history.is_empty());
        let stored = repo.get_campaign(c.id).await.ok();
        assert_eq!(stored.map(|s| s.status), Some(CampaignStatus::PendingReview));
    }

    #[tokio::test]
    async fn trust_score_events_chain_previous_scores() {
        let repo = InMemoryRepository::new();
        let c = draft();
        let _ = repo.insert_campaign(&c).await;

        let _ = repo.record_trust_score(c.id, 40, "recalculated").await;
        let Ok((campaign, event)) = repo.record_trust_score(c.id, 55, "update_posted").await
        else {
            panic!("record failed");
        };
        assert_eq!(campaign.trust_score, 55);
        assert_eq!(campaign.version, c.version);
        assert_eq!(event.previous_score, 40);
        assert_eq!(event.score_change, 15);

        let history = repo.trust_score_history(c.id).await.unwrap_or_default();
        assert_eq!(history.len(), 2);
        assert_eq!(history.first().map(|e| e.new_score), Some(55));
    }

    #[tokio::test]
    async fn settle_success_funds_campaign_at_goal() {
        let repo = InMemoryRepository::new();
        let mut c = draft();
        c.status = CampaignStatus::Funding;
        c.raised_amount = 9_000;
        let _ = repo.insert_campaign(&c).await;
        let _ = repo
            .insert_donation(&pending_donation(c.id, 1_000, "pi_1"))
            .await;

        let Ok(settled) = repo
            .settle_donation("pi_1", PaymentStatus::Succeeded)
            .await
        else {
            panic!("settle failed");
        };
        assert!(settled.applied);
        assert_eq!(settled.donation.payment_status, PaymentStatus::Succeeded);
        assert_eq!(settled.campaign.raised_amount, 10_000);
        assert_eq!(settled.campaign.status, CampaignStatus::Funded);

        // A replayed webhook changes nothing.
        let Ok(again) = repo.settle_donation("pi_1", PaymentStatus::Succeeded).await else {
            panic!("replay failed");
        };
        assert!(!again.applied);
        assert_eq!(again.campaign.raised_amount, 10_000);
    }

    #[tokio::test]
    async fn settle_never_exceeds_goal() {
        let repo = InMemoryRepository::new();
        let mut c = draft();
        c.status = CampaignStatus::Funding;
        c.raised_amount = 9_500;
        let _ = repo.insert_campaign(&c).await;
        let _ = repo
            .insert_donation(&pending_donation(c.id, 1_000, "pi_2"))
            .await;

        let result = repo.settle_donation("pi_2", PaymentStatus::Succeeded).await;
        assert!(matches!(result, Err(ServiceError::GoalExceeded { .. })));
        let stored = repo.get_campaign(c.id).await.ok();
        assert_eq!(stored.map(|s| s.raised_amount), Some(9_500));
    }

    #[tokio::test]
    async fn anonymize_only_touches_donor() {
        let repo = InMemoryRepository::new();
        let c = draft();
        let _ = repo.insert_campaign(&c).await;
        let donor = UserId::new();
        let mut mine = pending_donation(c.id, 100, "pi_a");
        mine.donor_id = Some(donor);
        mine.donor_email = Some("me@example.org".to_string());
        let mut theirs = pending_donation(c.id, 100, "pi_b");
        theirs.donor_id = Some(UserId::new());
        let _ = repo.insert_donation(&mine).await;
        let _ = repo.insert_donation(&theirs).await;

        assert_eq!(repo.anonymize_donor(donor).await.ok(), Some(1));
        let donations = repo.list_donations(c.id).await.unwrap_or_default();
        assert_eq!(donations.len(), 2);
        assert!(donations.iter().filter(|d| d.donor_id.is_some()).count() == 1);
        assert!(donations.iter().all(|d| d.donor_email.is_none()));
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let repo = InMemoryRepository::new();
        repo.inject_failures(1, true);
        let first = repo.count_pending_review().await;
        assert!(matches!(first, Err(ServiceError::Unavailable(_))));
        assert!(repo.count_pending_review().await.is_ok());
    }
}
