//! Donation service: payment intents, webhook settlement, donor privacy.

use std::sync::Arc;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::trust_event::REASON_DONATION_RECEIVED;
use crate::domain::{
    Actor, Campaign, CampaignEvent, CampaignId, CampaignStatus, Donation, EventBus, PaymentStatus,
};
use crate::error::ServiceError;
use crate::persistence::CampaignRepository;
use crate::service::payment::{IntentRequest, PaymentProcessor};
use crate::service::{RetryPolicy, TrustService};

/// A donation a supporter wants to make.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DonationRequest {
    /// Amount in minor units.
    pub amount: i64,
    /// ISO currency code; must match the campaign.
    pub currency: String,
    /// Display name for guest donors.
    #[serde(default)]
    pub donor_name: Option<String>,
    /// Receipt address for guest donors.
    #[serde(default)]
    pub donor_email: Option<String>,
}

/// A pending donation and the secret needed to complete it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DonationIntent {
    /// Donation identifier.
    pub donation_id: uuid::Uuid,
    /// Processor payment intent identifier.
    pub payment_intent_id: String,
    /// Client secret for the payment form.
    pub client_secret: String,
    /// Amount in minor units.
    pub amount: i64,
    /// Currency code.
    pub currency: String,
}

/// A settled payment.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentConfirmation {
    /// The donation after settlement.
    pub donation: Donation,
    /// The campaign after settlement.
    pub campaign: Campaign,
    /// `false` if the webhook was a replay.
    pub applied: bool,
}

/// Donation orchestration.
#[derive(Debug, Clone)]
pub struct DonationService {
    repo: Arc<dyn CampaignRepository>,
    trust: TrustService,
    payments: Arc<dyn PaymentProcessor>,
    event_bus: EventBus,
    retry: RetryPolicy,
    pending_ttl: Duration,
}

impl DonationService {
    /// Creates a new `DonationService`. A pending donation holds its share
    /// of the goal for `pending_ttl`.
    #[must_use]
    pub fn new(
        repo: Arc<dyn CampaignRepository>,
        trust: TrustService,
        payments: Arc<dyn PaymentProcessor>,
        event_bus: EventBus,
        retry: RetryPolicy,
        pending_ttl: Duration,
    ) -> Self {
        Self {
            repo,
            trust,
            payments,
            event_bus,
            retry,
            pending_ttl,
        }
    }

    /// Oldest creation time at which a pending donation still reserves
    /// part of the goal.
    fn reservation_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.pending_ttl)
            .ok()
            .and_then(|ttl| now.checked_sub_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Opens a payment intent and records a pending donation.
    ///
    /// Pending donations younger than the reservation TTL count against the
    /// goal, so concurrent intents cannot together overshoot it. Older ones
    /// are treated as abandoned checkouts and release their share.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for a bad amount or currency,
    /// [`ServiceError::InvalidRequest`] unless the campaign is funding,
    /// [`ServiceError::GoalExceeded`] when the amount does not fit, and
    /// [`ServiceError::Payment`] or [`ServiceError::Unavailable`] from the
    /// processor.
    pub async fn create_donation_intent(
        &self,
        actor: Option<&Actor>,
        campaign_id: CampaignId,
        request: DonationRequest,
    ) -> Result<DonationIntent, ServiceError> {
        if request.amount <= 0 {
            return Err(ServiceError::Validation(vec![
                "amount must be positive".to_string(),
            ]));
        }

        let repo = &self.repo;
        let campaign = self
            .retry
            .run("get_campaign", move || repo.get_campaign(campaign_id))
            .await?;
        if campaign.status != CampaignStatus::Funding {
            return Err(ServiceError::InvalidRequest(format!(
                "campaign is not accepting donations while {}",
                campaign.status
            )));
        }
        let currency = request.currency.to_ascii_lowercase();
        if currency != campaign.currency {
            return Err(ServiceError::Validation(vec![format!(
                "currency must be {}",
                campaign.currency
            )]));
        }

        let donations = self
            .retry
            .run("list_donations", move || repo.list_donations(campaign_id))
            .await?;
        let cutoff = self.reservation_cutoff(Utc::now());
        let pending: i64 = donations
            .iter()
            .filter(|d| d.payment_status == PaymentStatus::Pending && d.created_at > cutoff)
            .map(|d| d.amount)
            .fold(0, i64::saturating_add);
        let remaining = campaign.remaining_amount().saturating_sub(pending).max(0);
        if request.amount > remaining {
            return Err(ServiceError::GoalExceeded {
                amount: request.amount,
                remaining,
            });
        }

        let donation_id = uuid::Uuid::new_v4();
        let intent_request = IntentRequest {
            amount: request.amount,
            currency: &currency,
            campaign_id,
            idempotency_key: donation_id,
        };
        let payments = &self.payments;
        let intent_request = &intent_request;
        let intent = self
            .retry
            .run("create_payment_intent", move || {
                payments.create_payment_intent(intent_request)
            })
            .await?;

        let donation = Donation {
            id: donation_id,
            campaign_id,
            donor_id: actor.map(|a| a.user_id),
            donor_name: request.donor_name,
            donor_email: request.donor_email,
            amount: request.amount,
            currency: currency.clone(),
            payment_intent_id: intent.id.clone(),
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        };
        self.repo.insert_donation(&donation).await?;

        tracing::info!(
            campaign_id = %campaign_id,
            donation_id = %donation_id,
            amount = request.amount,
            "donation intent created"
        );
        Ok(DonationIntent {
            donation_id,
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
            amount: request.amount,
            currency,
        })
    }

    /// Settles a payment reported by the processor webhook. Replays of an
    /// already-settled payment change nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::DonationNotFound`] for an unknown intent and
    /// [`ServiceError::GoalExceeded`] if the payment no longer fits.
    pub async fn confirm_payment(
        &self,
        payment_intent_id: &str,
        succeeded: bool,
    ) -> Result<PaymentConfirmation, ServiceError> {
        let status = if succeeded {
            PaymentStatus::Succeeded
        } else {
            PaymentStatus::Failed
        };
        let settlement = self.repo.settle_donation(payment_intent_id, status).await?;
        let mut campaign = settlement.campaign;
        let donation = settlement.donation;

        if !settlement.applied {
            tracing::debug!(payment_intent_id, "payment already settled");
        } else if donation.payment_status == PaymentStatus::Succeeded {
            tracing::info!(
                campaign_id = %campaign.id,
                amount = donation.amount,
                raised = campaign.raised_amount,
                status = %campaign.status,
                "donation confirmed"
            );
            let _ = self.event_bus.publish(CampaignEvent::DonationConfirmed {
                campaign_id: campaign.id,
                amount: donation.amount,
                raised_amount: campaign.raised_amount,
                status: campaign.status,
                timestamp: Utc::now(),
            });
            match self
                .trust
                .recalculate(campaign.id, REASON_DONATION_RECEIVED)
                .await
            {
                Ok((rescored, _)) => campaign = rescored,
                Err(err) => {
                    tracing::warn!(campaign_id = %campaign.id, error = %err, "trust recalculation failed");
                }
            }
        } else {
            tracing::info!(campaign_id = %campaign.id, payment_intent_id, "payment failed");
        }

        Ok(PaymentConfirmation {
            donation,
            campaign,
            applied: settlement.applied,
        })
    }

    /// Removes the caller's identity from every donation they made.
    ///
    /// # Errors
    ///
    /// Returns the repository error.
    pub async fn anonymize_donor(&self, actor: &Actor) -> Result<u64, ServiceError> {
        let count = self.repo.anonymize_donor(actor.user_id).await?;
        tracing::info!(donor_id = %actor.user_id, count, "donor anonymized");
        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::service::ModerationPolicy;
    use crate::service::fixtures::{Harness, actor, complete_draft, harness, harness_with_processor};
    use crate::service::payment::mock::MockProcessor;
    use std::sync::atomic::Ordering;

    fn request(amount: i64) -> DonationRequest {
        DonationRequest {
            amount,
            currency: "usd".to_string(),
            donor_name: None,
            donor_email: None,
        }
    }

    async fn funding_campaign(h: &Harness) -> Campaign {
        let owner = actor(Role::Recipient);
        let Ok(campaign) = h.moderation.create_campaign(&owner, complete_draft()).await else {
            panic!("create failed");
        };
        let Ok(_) = h.moderation.submit_campaign(&owner, campaign.id).await else {
            panic!("submit failed");
        };
        let Ok(approved) = h
            .moderation
            .approve_campaign(&actor(Role::Moderator), campaign.id, None, None)
            .await
        else {
            panic!("approve failed");
        };
        approved
    }

    #[tokio::test]
    async fn intent_records_pending_donation() {
        let h = harness(ModerationPolicy::default());
        let campaign = funding_campaign(&h).await;
        let donor = actor(Role::Donor);

        let Ok(intent) = h
            .donations
            .create_donation_intent(Some(&donor), campaign.id, request(2_500))
            .await
        else {
            panic!("intent failed");
        };
        assert!(intent.payment_intent_id.starts_with("pi_"));

        let Ok(donations) = h.repo.list_donations(campaign.id).await else {
            panic!("list failed");
        };
        assert_eq!(donations.len(), 1);
        let Some(donation) = donations.first() else {
            panic!("expected a donation");
        };
        assert_eq!(donation.payment_status, PaymentStatus::Pending);
        assert_eq!(donation.donor_id, Some(donor.user_id));
    }

    #[tokio::test]
    async fn intent_requires_funding_campaign() {
        let h = harness(ModerationPolicy::default());
        let Ok(draft) = h
            .moderation
            .create_campaign(&actor(Role::Recipient), complete_draft())
            .await
        else {
            panic!("create failed");
        };
        let Err(ServiceError::InvalidRequest(_)) = h
            .donations
            .create_donation_intent(None, draft.id, request(100))
            .await
        else {
            panic!("expected InvalidRequest");
        };
    }

    #[tokio::test]
    async fn intent_validates_amount_and_currency() {
        let h = harness(ModerationPolicy::default());
        let campaign = funding_campaign(&h).await;
        let Err(ServiceError::Validation(_)) = h
            .donations
            .create_donation_intent(None, campaign.id, request(0))
            .await
        else {
            panic!("expected Validation for amount");
        };
        let mut eur = request(100);
        eur.currency = "eur".to_string();
        let Err(ServiceError::Validation(_)) = h
            .donations
            .create_donation_intent(None, campaign.id, eur)
            .await
        else {
            panic!("expected Validation for currency");
        };
    }

    #[tokio::test]
    async fn pending_donations_count_against_goal() {
        let h = harness(ModerationPolicy::default());
        let campaign = funding_campaign(&h).await;
        let Ok(_) = h
            .donations
            .create_donation_intent(None, campaign.id, request(8_000))
            .await
        else {
            panic!("intent failed");
        };
        let Err(ServiceError::GoalExceeded { remaining, .. }) = h
            .donations
            .create_donation_intent(None, campaign.id, request(3_000))
            .await
        else {
            panic!("expected GoalExceeded");
        };
        assert_eq!(remaining, 2_000);
    }

    fn pending_donation(campaign: &Campaign, amount: i64, age: chrono::Duration) -> Donation {
        Donation {
            id: uuid::Uuid::new_v4(),
            campaign_id: campaign.id,
            donor_id: None,
            donor_name: None,
            donor_email: None,
            amount,
            currency: "usd".to_string(),
            payment_intent_id: format!("pi_{}", uuid::Uuid::new_v4().simple()),
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now() - age,
        }
    }

    #[tokio::test]
    async fn abandoned_checkout_releases_the_goal() {
        let h = harness(ModerationPolicy::default());
        let campaign = funding_campaign(&h).await;
        let abandoned = pending_donation(&campaign, 10_000, chrono::Duration::hours(2));
        let Ok(()) = h.repo.insert_donation(&abandoned).await else {
            panic!("insert failed");
        };

        let Ok(intent) = h
            .donations
            .create_donation_intent(None, campaign.id, request(1))
            .await
        else {
            panic!("stale reservation should not block donations");
        };
        assert_eq!(intent.amount, 1);
    }

    #[tokio::test]
    async fn fresh_reservation_still_holds_the_goal() {
        let h = harness(ModerationPolicy::default());
        let campaign = funding_campaign(&h).await;
        let recent = pending_donation(&campaign, 10_000, chrono::Duration::minutes(5));
        let Ok(()) = h.repo.insert_donation(&recent).await else {
            panic!("insert failed");
        };

        let Err(ServiceError::GoalExceeded { remaining: 0, .. }) = h
            .donations
            .create_donation_intent(None, campaign.id, request(1))
            .await
        else {
            panic!("expected GoalExceeded");
        };
    }

    #[tokio::test]
    async fn confirmation_reaches_goal_and_rescores() {
        let h = harness(ModerationPolicy::default());
        let campaign = funding_campaign(&h).await;
        let mut rx = h.bus.subscribe();
        let Ok(intent) = h
            .donations
            .create_donation_intent(None, campaign.id, request(10_000))
            .await
        else {
            panic!("intent failed");
        };

        let Ok(confirmed) = h
            .donations
            .confirm_payment(&intent.payment_intent_id, true)
            .await
        else {
            panic!("confirm failed");
        };
        assert!(confirmed.applied);
        assert_eq!(confirmed.campaign.raised_amount, 10_000);
        assert_eq!(confirmed.campaign.status, CampaignStatus::Funded);

        let Ok(CampaignEvent::DonationConfirmed { status, .. }) = rx.recv().await else {
            panic!("expected DonationConfirmed");
        };
        assert_eq!(status, CampaignStatus::Funded);

        let Ok(history) = h.trust.get_trust_score_history(campaign.id).await else {
            panic!("history failed");
        };
        assert_eq!(
            history.first().map(|e| e.reason.as_str()),
            Some(REASON_DONATION_RECEIVED)
        );
    }

    #[tokio::test]
    async fn replayed_webhook_is_idempotent() {
        let h = harness(ModerationPolicy::default());
        let campaign = funding_campaign(&h).await;
        let Ok(intent) = h
            .donations
            .create_donation_intent(None, campaign.id, request(1_000))
            .await
        else {
            panic!("intent failed");
        };
        let Ok(_) = h
            .donations
            .confirm_payment(&intent.payment_intent_id, true)
            .await
        else {
            panic!("confirm failed");
        };
        let Ok(replay) = h
            .donations
            .confirm_payment(&intent.payment_intent_id, true)
            .await
        else {
            panic!("replay failed");
        };
        assert!(!replay.applied);
        assert_eq!(replay.campaign.raised_amount, 1_000);
    }

    #[tokio::test]
    async fn failed_payment_leaves_total_unchanged() {
        let h = harness(ModerationPolicy::default());
        let campaign = funding_campaign(&h).await;
        let Ok(intent) = h
            .donations
            .create_donation_intent(None, campaign.id, request(1_000))
            .await
        else {
            panic!("intent failed");
        };
        let Ok(confirmed) = h
            .donations
            .confirm_payment(&intent.payment_intent_id, false)
            .await
        else {
            panic!("confirm failed");
        };
        assert_eq!(confirmed.donation.payment_status, PaymentStatus::Failed);
        assert_eq!(confirmed.campaign.raised_amount, 0);
    }

    #[tokio::test]
    async fn unknown_intent_is_not_found() {
        let h = harness(ModerationPolicy::default());
        let Err(ServiceError::DonationNotFound(_)) =
            h.donations.confirm_payment("pi_missing", true).await
        else {
            panic!("expected DonationNotFound");
        };
    }

    #[tokio::test]
    async fn transient_processor_failures_are_retried() {
        let h = harness_with_processor(
            ModerationPolicy::default(),
            MockProcessor {
                fail_first: 2,
                ..MockProcessor::default()
            },
        );
        let campaign = funding_campaign(&h).await;
        let result = h
            .donations
            .create_donation_intent(None, campaign.id, request(500))
            .await;
        assert!(result.is_ok());
        assert_eq!(h.payments.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn anonymize_strips_donor() {
        let h = harness(ModerationPolicy::default());
        let campaign = funding_campaign(&h).await;
        let donor = actor(Role::Donor);
        let mut req = request(700);
        req.donor_name = Some("Ada".to_string());
        req.donor_email = Some("ada@example.org".to_string());
        let Ok(_) = h
            .donations
            .create_donation_intent(Some(&donor), campaign.id, req)
            .await
        else {
            panic!("intent failed");
        };

        assert_eq!(h.donations.anonymize_donor(&donor).await.ok(), Some(1));
        let Ok(donations) = h.repo.list_donations(campaign.id).await else {
            panic!("list failed");
        };
        assert!(donations.iter().all(|d| d.donor_id.is_none()
            && d.donor_name.is_none()
            && d.donor_email.is_none()));
    }
}
