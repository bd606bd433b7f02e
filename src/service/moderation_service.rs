//! Moderation service: campaign lifecycle from draft to review decision.
//!
//! Every status change is a compare-and-swap on the campaign version, so a
//! decision taken on stale data is refused rather than silently applied.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::content::{ContentCheck, ContentChecker};
use crate::domain::trust_event::{
    REASON_MODERATION_SCREENING, REASON_UPDATE_POSTED, REASON_VERIFICATION_COMPLETED,
};
use crate::domain::{
    Actor, Campaign, CampaignDraft, CampaignEvent, CampaignId, CampaignPatch, CampaignStatus,
    CampaignUpdate, ContentFlag, EventBus, ModerationDecision, ModerationRecord,
};
use crate::error::ServiceError;
use crate::persistence::{CampaignRepository, ReviewCommit};
use crate::service::notifier::{Notifier, notify_quietly};
use crate::service::{ModerationPolicy, RetryPolicy, TrustService};

/// Largest page the moderation queue returns.
pub const MAX_QUEUE_PAGE: u32 = 100;

/// Outcome of automated screening.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ModerationResult {
    /// Screened campaign.
    pub campaign_id: CampaignId,
    /// Decision reached.
    pub decision: ModerationDecision,
    /// Trust score at screening time.
    pub score: u8,
    /// Content screening of title, story, and updates.
    pub content: ContentCheck,
    /// Negative content categories raised.
    pub flags: Vec<ContentFlag>,
    /// `true` if the decision changed the campaign status.
    pub applied: bool,
    /// Campaign after screening.
    pub campaign: Campaign,
}

/// An update together with its screening.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PostedUpdate {
    /// The stored update.
    pub update: CampaignUpdate,
    /// Screening of the update text.
    pub content: ContentCheck,
    /// Campaign trust score after the update.
    pub trust_score: u8,
}

/// A page of the review queue.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QueuePage {
    /// Campaigns in submission order.
    pub campaigns: Vec<Campaign>,
    /// Campaigns awaiting review in total.
    pub total: u64,
}

/// Review input shared by the human decisions.
struct Review {
    decision: ModerationDecision,
    notes: Option<String>,
    required_changes: Vec<String>,
    expected_version: Option<i64>,
}

/// Campaign lifecycle orchestration.
#[derive(Debug, Clone)]
pub struct ModerationService {
    repo: Arc<dyn CampaignRepository>,
    trust: TrustService,
    checker: Arc<ContentChecker>,
    policy: ModerationPolicy,
    notifier: Arc<dyn Notifier>,
    event_bus: EventBus,
    retry: RetryPolicy,
}

impl ModerationService {
    /// Creates a new `ModerationService`.
    #[must_use]
    pub fn new(
        repo: Arc<dyn CampaignRepository>,
        trust: TrustService,
        checker: Arc<ContentChecker>,
        policy: ModerationPolicy,
        notifier: Arc<dyn Notifier>,
        event_bus: EventBus,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repo,
            trust,
            checker,
            policy,
            notifier,
            event_bus,
            retry,
        }
    }

    /// Screens free text.
    #[must_use]
    pub fn check_content(&self, text: &str) -> ContentCheck {
        self.checker.check(text)
    }

    /// Creates a draft owned by `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for a non-positive goal or a
    /// malformed currency code.
    pub async fn create_campaign(
        &self,
        actor: &Actor,
        draft: CampaignDraft,
    ) -> Result<Campaign, ServiceError> {
        let mut errors = Vec::new();
        if draft.goal_amount <= 0 {
            errors.push("goal_amount must be positive".to_string());
        }
        if draft.currency.len() != 3 || !draft.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            errors.push("currency must be a three-letter ISO code".to_string());
        }
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        let campaign = Campaign::new_draft(actor.user_id, draft);
        self.repo.insert_campaign(&campaign).await?;
        tracing::info!(campaign_id = %campaign.id, owner_id = %actor.user_id, "campaign drafted");
        Ok(campaign)
    }

    /// Fetches a campaign.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::CampaignNotFound`] when absent.
    pub async fn get_campaign(&self, id: CampaignId) -> Result<Campaign, ServiceError> {
        let repo = &self.repo;
        self.retry
            .run("get_campaign", move || repo.get_campaign(id))
            .await
    }

    /// Edits the content of a campaign the owner may still change.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] for anyone but the owner,
    /// [`ServiceError::InvalidRequest`] when the campaign is locked, and
    /// [`ServiceError::StaleState`] on a version mismatch.
    pub async fn update_draft(
        &self,
        actor: &Actor,
        id: CampaignId,
        patch: CampaignPatch,
        expected_version: Option<i64>,
    ) -> Result<Campaign, ServiceError> {
        let mut campaign = self.get_campaign(id).await?;
        ensure_owner(actor, &campaign)?;
        if !campaign.is_editable() {
            return Err(ServiceError::InvalidRequest(format!(
                "campaign cannot be edited while {}",
                campaign.status
            )));
        }
        if patch.goal_amount.is_some_and(|g| g <= 0) {
            return Err(ServiceError::Validation(vec![
                "goal_amount must be positive".to_string(),
            ]));
        }

        let expected = expected_version.unwrap_or(campaign.version);
        campaign.apply(patch);
        let saved = self.repo.save_campaign(&campaign, expected).await?;
        tracing::debug!(campaign_id = %id, version = saved.version, "campaign edited");
        Ok(saved)
    }

    /// Submits a draft for review, or resubmits after requested changes.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] listing every unmet requirement,
    /// [`ServiceError::InvalidTransition`] outside Draft, and
    /// [`ServiceError::StaleState`] on a concurrent change.
    pub async fn submit_campaign(
        &self,
        actor: &Actor,
        id: CampaignId,
    ) -> Result<Campaign, ServiceError> {
        let mut campaign = self.get_campaign(id).await?;
        ensure_owner(actor, &campaign)?;

        let resubmission =
            campaign.status == CampaignStatus::PendingReview && campaign.changes_requested;
        if campaign.status != CampaignStatus::Draft && !resubmission {
            return Err(ServiceError::InvalidTransition {
                from: campaign.status,
                to: CampaignStatus::PendingReview,
            });
        }

        let missing = campaign.submission_errors();
        if !missing.is_empty() {
            return Err(ServiceError::Validation(
                missing.iter().map(ToString::to_string).collect(),
            ));
        }

        let expected = campaign.version;
        let now = Utc::now();
        campaign.status = CampaignStatus::PendingReview;
        campaign.changes_requested = false;
        campaign.submitted_at = Some(now);
        let saved = self.repo.save_campaign(&campaign, expected).await?;

        tracing::info!(campaign_id = %id, resubmission, "campaign submitted for review");
        let _ = self.event_bus.publish(CampaignEvent::CampaignSubmitted {
            campaign_id: id,
            timestamp: now,
        });
        Ok(saved)
    }

    /// Runs automated screening over a campaign awaiting review.
    ///
    /// The score is persisted with reason `moderation_screening` and an
    /// automated record is appended. Under an auto-applying policy,
    /// Approved and Rejected outcomes also change the status.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidTransition`] unless the campaign is
    /// pending review, or any read or write failure.
    pub async fn moderate_campaign(&self, id: CampaignId) -> Result<ModerationResult, ServiceError> {
        let campaign = self.get_campaign(id).await?;
        if campaign.status != CampaignStatus::PendingReview {
            return Err(ServiceError::InvalidTransition {
                from: campaign.status,
                to: CampaignStatus::Funding,
            });
        }

        let repo = &self.repo;
        let updates = self
            .retry
            .run("list_updates", move || repo.list_updates(id))
            .await?;
        let content = self.checker.check_all(
            [campaign.title.as_str(), campaign.story_markdown.as_str()]
                .into_iter()
                .chain(
                    updates
                        .iter()
                        .flat_map(|u| [u.title.as_str(), u.content.as_str()]),
                ),
        );
        let score = self.trust.score_of(&campaign).await?.score;
        let decision = self.policy.decide(score, &content);
        let flags = content.flags();

        self.trust
            .update_trust_score(id, score, REASON_MODERATION_SCREENING)
            .await?;

        let record = ModerationRecord::new(id, decision, score, None)
            .with_flags(flags.clone())
            .with_notes(screening_notes(&content));
        let applied = self.policy.commits(decision);
        let campaign = if applied {
            self.repo
                .commit_review(
                    id,
                    ReviewCommit {
                        expected_version: campaign.version,
                        new_status: decision.target_status(),
                        changes_requested: false,
                        record: &record,
                    },
                )
                .await?
        } else {
            self.repo.append_moderation_record(&record).await?;
            self.get_campaign(id).await?
        };

        tracing::info!(campaign_id = %id, decision = ?decision, score, applied, "campaign screened");
        let _ = self.event_bus.publish(CampaignEvent::CampaignModerated {
            campaign_id: id,
            decision,
            score,
            flags: flags.clone(),
            timestamp: record.created_at,
        });
        if applied {
            self.announce_decision(&campaign, decision, None, record.notes.as_deref(), &[])
                .await;
        }

        Ok(ModerationResult {
            campaign_id: id,
            decision,
            score,
            content,
            flags,
            applied,
            campaign,
        })
    }

    /// Approves a campaign; it starts accepting donations.
    ///
    /// # Errors
    ///
    /// See [`ModerationService::request_changes`].
    pub async fn approve_campaign(
        &self,
        actor: &Actor,
        id: CampaignId,
        notes: Option<String>,
        expected_version: Option<i64>,
    ) -> Result<Campaign, ServiceError> {
        self.review(
            actor,
            id,
            Review {
                decision: ModerationDecision::Approved,
                notes,
                required_changes: Vec::new(),
                expected_version,
            },
        )
        .await
    }

    /// Rejects a campaign.
    ///
    /// # Errors
    ///
    /// See [`ModerationService::request_changes`].
    pub async fn reject_campaign(
        &self,
        actor: &Actor,
        id: CampaignId,
        notes: Option<String>,
        expected_version: Option<i64>,
    ) -> Result<Campaign, ServiceError> {
        self.review(
            actor,
            id,
            Review {
                decision: ModerationDecision::Rejected,
                notes,
                required_changes: Vec::new(),
                expected_version,
            },
        )
        .await
    }

    /// Sends a campaign back to its owner with a list of changes. The
    /// campaign stays pending review and becomes editable again.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless `actor` is a moderator or
    /// admin, [`ServiceError::InvalidTransition`] unless the campaign is
    /// pending review, and [`ServiceError::StaleState`] if the campaign
    /// changed after `expected_version`.
    pub async fn request_changes(
        &self,
        actor: &Actor,
        id: CampaignId,
        changes: Vec<String>,
        notes: Option<String>,
        expected_version: Option<i64>,
    ) -> Result<Campaign, ServiceError> {
        let changes: Vec<String> = changes
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if changes.is_empty() {
            return Err(ServiceError::Validation(vec![
                "at least one requested change is required".to_string(),
            ]));
        }
        self.review(
            actor,
            id,
            Review {
                decision: ModerationDecision::ChangesRequested,
                notes,
                required_changes: changes,
                expected_version,
            },
        )
        .await
    }

    async fn review(
        &self,
        actor: &Actor,
        id: CampaignId,
        review: Review,
    ) -> Result<Campaign, ServiceError> {
        if !actor.is_reviewer() {
            return Err(ServiceError::Forbidden(
                "only moderators may review campaigns".to_string(),
            ));
        }
        let campaign = self.get_campaign(id).await?;
        let target = review.decision.target_status();
        if campaign.status != CampaignStatus::PendingReview
            || !campaign.status.can_transition_to(target)
        {
            return Err(ServiceError::InvalidTransition {
                from: campaign.status,
                to: target,
            });
        }

        let record = ModerationRecord::new(
            id,
            review.decision,
            campaign.trust_score,
            Some(actor.user_id),
        )
        .with_notes(review.notes)
        .with_required_changes(review.required_changes);

        let updated = self
            .repo
            .commit_review(
                id,
                ReviewCommit {
                    expected_version: review.expected_version.unwrap_or(campaign.version),
                    new_status: target,
                    changes_requested: review.decision == ModerationDecision::ChangesRequested,
                    record: &record,
                },
            )
            .await?;

        tracing::info!(
            campaign_id = %id,
            reviewer_id = %actor.user_id,
            decision = ?review.decision,
            status = %updated.status,
            "review committed"
        );
        self.announce_decision(
            &updated,
            review.decision,
            Some(actor),
            record.notes.as_deref(),
            &record.required_changes,
        )
        .await;
        Ok(updated)
    }

    async fn announce_decision(
        &self,
        campaign: &Campaign,
        decision: ModerationDecision,
        reviewer: Option<&Actor>,
        notes: Option<&str>,
        changes: &[String],
    ) {
        let reviewer_id = reviewer.map(|r| r.user_id);
        let timestamp = Utc::now();
        let (event, message) = match decision {
            ModerationDecision::Approved => (
                CampaignEvent::CampaignApproved {
                    campaign_id: campaign.id,
                    reviewer_id,
                    timestamp,
                },
                format!(
                    "Your campaign \"{}\" was approved and is now accepting donations.",
                    campaign.title
                ),
            ),
            ModerationDecision::Rejected => (
                CampaignEvent::CampaignRejected {
                    campaign_id: campaign.id,
                    reviewer_id,
                    timestamp,
                },
                match notes {
                    Some(notes) => format!(
                        "Your campaign \"{}\" was not approved: {notes}",
                        campaign.title
                    ),
                    None => format!("Your campaign \"{}\" was not approved.", campaign.title),
                },
            ),
            ModerationDecision::ChangesRequested => {
                let Some(reviewer_id) = reviewer_id else {
                    return;
                };
                (
                    CampaignEvent::ChangesRequested {
                        campaign_id: campaign.id,
                        reviewer_id,
                        change_count: changes.len(),
                        timestamp,
                    },
                    format!(
                        "Changes were requested for \"{}\": {}",
                        campaign.title,
                        changes.join("; ")
                    ),
                )
            }
            ModerationDecision::Review => return,
        };
        let _ = self.event_bus.publish(event);
        notify_quietly(self.notifier.as_ref(), campaign, &message).await;
    }

    /// Marks the creator's identity as verified and rescores the campaign.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] for non-admins, or the
    /// repository error.
    pub async fn verify_creator(
        &self,
        actor: &Actor,
        id: CampaignId,
    ) -> Result<Campaign, ServiceError> {
        if !actor.is_admin() {
            return Err(ServiceError::Forbidden(
                "only administrators may verify creators".to_string(),
            ));
        }
        let mut campaign = self.get_campaign(id).await?;
        let expected = campaign.version;
        campaign.creator_verified = true;
        let saved = self.repo.save_campaign(&campaign, expected).await?;
        tracing::info!(campaign_id = %id, admin_id = %actor.user_id, "creator verified");
        Ok(self.rescore(saved, REASON_VERIFICATION_COMPLETED).await)
    }

    /// Posts a progress update on a live campaign.
    ///
    /// # Errors
    ///
    /// An update that fails content screening is still published, but an
    /// automated `review` record is appended to the campaign's moderation
    /// history and `campaign_moderated` is emitted.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] for anyone but the owner,
    /// [`ServiceError::InvalidRequest`] unless the campaign is funding or
    /// funded, and [`ServiceError::Validation`] for empty text.
    pub async fn post_update(
        &self,
        actor: &Actor,
        id: CampaignId,
        title: String,
        content: String,
    ) -> Result<PostedUpdate, ServiceError> {
        let campaign = self.get_campaign(id).await?;
        ensure_owner(actor, &campaign)?;
        if !matches!(
            campaign.status,
            CampaignStatus::Funding | CampaignStatus::Funded
        ) {
            return Err(ServiceError::InvalidRequest(format!(
                "updates cannot be posted while {}",
                campaign.status
            )));
        }
        let mut errors = Vec::new();
        if title.trim().is_empty() {
            errors.push("title must not be empty".to_string());
        }
        if content.trim().is_empty() {
            errors.push("content must not be empty".to_string());
        }
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        let update = CampaignUpdate::new(id, title, content);
        let screening = self
            .checker
            .check_all([update.title.as_str(), update.content.as_str()]);
        let flagged = if screening.passed {
            None
        } else {
            // The review entry exists before the update is visible.
            let flags = screening.flags();
            let notes = match screening_notes(&screening) {
                Some(found) => format!("update {}: {found}", update.id),
                None => format!("update {}", update.id),
            };
            let record = ModerationRecord::new(
                id,
                ModerationDecision::Review,
                campaign.trust_score,
                None,
            )
            .with_flags(flags.clone())
            .with_notes(Some(notes));
            self.repo.append_moderation_record(&record).await?;
            tracing::warn!(campaign_id = %id, flags = ?flags, "update flagged for review");
            Some(record)
        };
        self.repo.insert_update(&update).await?;

        if let Some(record) = flagged {
            let _ = self.event_bus.publish(CampaignEvent::CampaignModerated {
                campaign_id: id,
                decision: record.decision,
                score: record.score,
                flags: record.flags,
                timestamp: record.created_at,
            });
        }
        let campaign = self.rescore(campaign, REASON_UPDATE_POSTED).await;
        Ok(PostedUpdate {
            update,
            content: screening,
            trust_score: campaign.trust_score,
        })
    }

    /// Review history, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::CampaignNotFound`] for an unknown campaign.
    pub async fn moderation_history(
        &self,
        id: CampaignId,
    ) -> Result<Vec<ModerationRecord>, ServiceError> {
        self.get_campaign(id).await?;
        let repo = &self.repo;
        self.retry
            .run("moderation_history", move || repo.moderation_history(id))
            .await
    }

    /// Campaigns awaiting review, oldest submission first.
    ///
    /// # Errors
    ///
    /// Returns the repository error.
    pub async fn pending_queue(&self, limit: u32, offset: u32) -> Result<QueuePage, ServiceError> {
        let limit = limit.clamp(1, MAX_QUEUE_PAGE);
        let repo = &self.repo;
        let campaigns = self
            .retry
            .run("list_pending_review", move || {
                repo.list_pending_review(limit, offset)
            })
            .await?;
        let total = self
            .retry
            .run("count_pending_review", move || repo.count_pending_review())
            .await?;
        Ok(QueuePage { campaigns, total })
    }

    /// Recalculates the trust score after a committed change. A failure is
    /// logged and the committed campaign returned as is.
    async fn rescore(&self, campaign: Campaign, reason: &str) -> Campaign {
        match self.trust.recalculate(campaign.id, reason).await {
            Ok((rescored, _)) => rescored,
            Err(err) => {
                tracing::warn!(campaign_id = %campaign.id, reason, error = %err, "trust recalculation failed");
                campaign
            }
        }
    }
}

fn ensure_owner(actor: &Actor, campaign: &Campaign) -> Result<(), ServiceError> {
    if actor.user_id != campaign.owner_id {
        return Err(ServiceError::Forbidden(
            "only the campaign owner may do this".to_string(),
        ));
    }
    Ok(())
}

fn screening_notes(content: &ContentCheck) -> Option<String> {
    let m = &content.matches;
    let parts: Vec<String> = [
        ("luxury", &m.luxury),
        ("inappropriate", &m.inappropriate),
        ("suspicious", &m.suspicious),
    ]
    .into_iter()
    .filter(|(_, terms)| !terms.is_empty())
    .map(|(label, terms)| format!("{label}: {}", terms.join(", ")))
    .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}
