//! Campaign aggregate and its lifecycle state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{CampaignId, UserId};

/// Minimum trimmed title length, in characters, required to submit.
pub const MIN_TITLE_CHARS: usize = 10;

/// Minimum trimmed story length, in characters, required to submit.
pub const MIN_STORY_CHARS: usize = 200;

/// Lifecycle status of a campaign.
///
/// ```text
/// Draft ──submit──▶ PendingReview ──approve──▶ Funding ──goal──▶ Funded ──▶ Completed
///   │                 │    ▲   │                  │
///   │                 │    └───┘ request changes  │
///   │                 └──reject──▶ Rejected       │
///   └──────────────┴──────────────────────────────┴──▶ Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    /// Being written by its owner; not visible to donors.
    Draft,
    /// Submitted and waiting for a moderation decision.
    PendingReview,
    /// Live and accepting donations.
    Funding,
    /// Goal reached.
    Funded,
    /// Funds disbursed and the campaign closed.
    Completed,
    /// Withdrawn by the owner or an administrator.
    Cancelled,
    /// Refused by moderation.
    Rejected,
}

impl CampaignStatus {
    /// Returns `true` if a campaign may move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Draft => matches!(next, Self::PendingReview | Self::Cancelled),
            Self::PendingReview => matches!(
                next,
                Self::PendingReview | Self::Funding | Self::Rejected | Self::Cancelled
            ),
            Self::Funding => matches!(next, Self::Funded | Self::Cancelled),
            Self::Funded => matches!(next, Self::Completed),
            Self::Completed | Self::Cancelled | Self::Rejected => false,
        }
    }

    /// Returns `true` if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Rejected)
    }

    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::PendingReview => "PENDING_REVIEW",
            Self::Funding => "FUNDING",
            Self::Funded => "FUNDED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "PENDING_REVIEW" => Ok(Self::PendingReview),
            "FUNDING" => Ok(Self::Funding),
            "FUNDED" => Ok(Self::Funded),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(format!("unknown campaign status: {other}")),
        }
    }
}

/// Kind of media attached to a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Still image.
    Image,
    /// Video clip or embed.
    Video,
    /// Supporting document (invoice, medical report, ...).
    Document,
}

/// A single media attachment. Order in [`Campaign::media`] is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MediaItem {
    /// Public URL of the asset.
    pub url: String,
    /// Media kind.
    pub kind: MediaKind,
}

/// One line of the campaign's budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BudgetItem {
    /// What the money is for.
    pub item: String,
    /// Amount in minor currency units.
    pub amount: i64,
    /// Optional free-text explanation.
    #[serde(default)]
    pub description: Option<String>,
}

/// A person or organisation the campaign benefits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Beneficiary {
    /// Display name.
    pub name: String,
    /// Relationship to the campaign owner.
    #[serde(default)]
    pub relationship: Option<String>,
}

/// A fundraising campaign.
///
/// `trust_score` is a cache of the newest trust score event and is only
/// written by the trust pipeline. `version` is bumped on every write and
/// guards status transitions against concurrent reviewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Campaign {
    /// Campaign identifier.
    pub id: CampaignId,
    /// The recipient who owns the campaign.
    pub owner_id: UserId,
    /// Lifecycle status.
    pub status: CampaignStatus,
    /// Headline.
    pub title: String,
    /// Long-form story in Markdown.
    pub story_markdown: String,
    /// Category slug, required for submission.
    pub category: Option<String>,
    /// Fundraising goal in minor currency units.
    pub goal_amount: i64,
    /// Confirmed donations in minor currency units. Never exceeds `goal_amount`.
    pub raised_amount: i64,
    /// ISO 4217 currency code, lower-case.
    pub currency: String,
    /// Cached trust score, 0–100.
    pub trust_score: u8,
    /// Ordered media attachments.
    pub media: Vec<MediaItem>,
    /// Budget lines.
    pub budget_breakdown: Vec<BudgetItem>,
    /// Beneficiaries.
    pub beneficiaries: Vec<Beneficiary>,
    /// Whether the owner's identity has been verified by an administrator.
    pub creator_verified: bool,
    /// Set while a reviewer's change request is outstanding.
    pub changes_requested: bool,
    /// Optimistic concurrency token.
    pub version: i64,
    /// Creation time. Absent on records imported without one.
    pub created_at: Option<DateTime<Utc>>,
    /// Time of the latest submission for review.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Time of the latest write.
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Builds a new draft owned by `owner_id`.
    #[must_use]
    pub fn new_draft(owner_id: UserId, draft: CampaignDraft) -> Self {
        let now = Utc::now();
        Self {
            id: CampaignId::new(),
            owner_id,
            status: CampaignStatus::Draft,
            title: draft.title,
            story_markdown: draft.story_markdown,
            category: draft.category,
            goal_amount: draft.goal_amount,
            raised_amount: 0,
            currency: draft.currency.to_ascii_lowercase(),
            trust_score: 0,
            media: draft.media,
            budget_breakdown: draft.budget_breakdown,
            beneficiaries: draft.beneficiaries,
            creator_verified: false,
            changes_requested: false,
            version: 1,
            created_at: Some(now),
            submitted_at: None,
            updated_at: now,
        }
    }

    /// Returns every requirement the campaign fails for submission.
    ///
    /// All requirements are checked; the result is empty when the
    /// campaign may be submitted.
    #[must_use]
    pub fn submission_errors(&self) -> Vec<SubmissionRequirement> {
        let mut missing = Vec::new();

        let title_len = self.title.trim().chars().count();
        if title_len < MIN_TITLE_CHARS {
            missing.push(SubmissionRequirement::TitleTooShort { actual: title_len });
        }

        let story_len = self.story_markdown.trim().chars().count();
        if story_len < MIN_STORY_CHARS {
            missing.push(SubmissionRequirement::StoryTooShort { actual: story_len });
        }

        if self.budget_breakdown.is_empty() {
            missing.push(SubmissionRequirement::MissingBudget);
        }

        if self
            .category
            .as_deref()
            .is_none_or(|c| c.trim().is_empty())
        {
            missing.push(SubmissionRequirement::MissingCategory);
        }

        if self.media.is_empty() {
            missing.push(SubmissionRequirement::MissingMedia);
        }

        missing
    }

    /// Returns `true` if the owner may currently edit the campaign content.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        match self.status {
            CampaignStatus::Draft => true,
            CampaignStatus::PendingReview => self.changes_requested,
            _ => false,
        }
    }

    /// Applies the set fields of `patch`.
    pub fn apply(&mut self, patch: CampaignPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(story) = patch.story_markdown {
            self.story_markdown = story;
        }
        if let Some(category) = patch.category {
            self.category = Some(category);
        }
        if let Some(goal) = patch.goal_amount {
            self.goal_amount = goal;
        }
        if let Some(media) = patch.media {
            self.media = media;
        }
        if let Some(budget) = patch.budget_breakdown {
            self.budget_breakdown = budget;
        }
        if let Some(beneficiaries) = patch.beneficiaries {
            self.beneficiaries = beneficiaries;
        }
    }

    /// Amount still needed to reach the goal.
    #[must_use]
    pub const fn remaining_amount(&self) -> i64 {
        self.goal_amount.saturating_sub(self.raised_amount)
    }
}

/// A requirement a campaign fails to meet for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionRequirement {
    /// Title shorter than [`MIN_TITLE_CHARS`].
    TitleTooShort {
        /// Trimmed character count found.
        actual: usize,
    },
    /// Story shorter than [`MIN_STORY_CHARS`].
    StoryTooShort {
        /// Trimmed character count found.
        actual: usize,
    },
    /// No budget lines.
    MissingBudget,
    /// No category selected.
    MissingCategory,
    /// No media attached.
    MissingMedia,
}

impl fmt::Display for SubmissionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TitleTooShort { actual } => write!(
                f,
                "title must be at least {MIN_TITLE_CHARS} characters (found {actual})"
            ),
            Self::StoryTooShort { actual } => write!(
                f,
                "story must be at least {MIN_STORY_CHARS} characters (found {actual})"
            ),
            Self::MissingBudget => f.write_str("budget breakdown must contain at least one item"),
            Self::MissingCategory => f.write_str("category must be set"),
            Self::MissingMedia => f.write_str("at least one media item is required"),
        }
    }
}

/// Input for creating a draft campaign.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CampaignDraft {
    /// Headline.
    #[serde(default)]
    pub title: String,
    /// Long-form story in Markdown.
    #[serde(default)]
    pub story_markdown: String,
    /// Category slug.
    #[serde(default)]
    pub category: Option<String>,
    /// Goal in minor currency units.
    pub goal_amount: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Media attachments.
    #[serde(default)]
    pub media: Vec<MediaItem>,
    /// Budget lines.
    #[serde(default)]
    pub budget_breakdown: Vec<BudgetItem>,
    /// Beneficiaries.
    #[serde(default)]
    pub beneficiaries: Vec<Beneficiary>,
}

/// Partial edit of a campaign's content. Unset fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CampaignPatch {
    /// New headline.
    #[serde(default)]
    pub title: Option<String>,
    /// New story.
    #[serde(default)]
    pub story_markdown: Option<String>,
    /// New category.
    #[serde(default)]
    pub category: Option<String>,
    /// New goal.
    #[serde(default)]
    pub goal_amount: Option<i64>,
    /// Replacement media list.
    #[serde(default)]
    pub media: Option<Vec<MediaItem>>,
    /// Replacement budget.
    #[serde(default)]
    pub budget_breakdown: Option<Vec<BudgetItem>>,
    /// Replacement beneficiaries.
    #[serde(default)]
    pub beneficiaries: Option<Vec<Beneficiary>>,
}

/// A progress post published by the campaign owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CampaignUpdate {
    /// Update identifier.
    pub id: uuid::Uuid,
    /// Campaign the update belongs to.
    pub campaign_id: CampaignId,
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Publication time.
    pub created_at: DateTime<Utc>,
}

impl CampaignUpdate {
    /// Creates an update stamped with the current time.
    #[must_use]
    pub fn new(campaign_id: CampaignId, title: String, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            campaign_id,
            title,
            content,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn empty_draft() -> CampaignDraft {
        CampaignDraft {
            title: String::new(),
            story_markdown: String::new(),
            category: None,
            goal_amount: 10_000,
            currency: "USD".to_string(),
            media: Vec::new(),
            budget_breakdown: Vec::new(),
            beneficiaries: Vec::new(),
        }
    }

    #[test]
    fn new_draft_normalizes_currency() {
        let campaign = Campaign::new_draft(UserId::new(), empty_draft());
        assert_eq!(campaign.currency, "usd");
        assert_eq!(campaign.status, CampaignStatus::Draft);
        assert_eq!(campaign.version, 1);
        assert!(campaign.created_at.is_some());
    }

    #[test]
    fn empty_campaign_reports_every_missing_requirement() {
        let campaign = Campaign::new_draft(UserId::new(), empty_draft());
        let errors = campaign.submission_errors();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&SubmissionRequirement::TitleTooShort { actual: 0 }));
        assert!(errors.contains(&SubmissionRequirement::StoryTooShort { actual: 0 }));
        assert!(errors.contains(&SubmissionRequirement::MissingBudget));
        assert!(errors.contains(&SubmissionRequirement::MissingCategory));
        assert!(errors.contains(&SubmissionRequirement::MissingMedia));
    }

    #[test]
    fn whitespace_is_not_counted_towards_lengths() {
        let mut draft = empty_draft();
        draft.title = "   short    ".to_string();
        draft.category = Some("  ".to_string());
        let campaign = Campaign::new_draft(UserId::new(), draft);
        let errors = campaign.submission_errors();
        assert!(errors.contains(&SubmissionRequirement::TitleTooShort { actual: 5 }));
        assert!(errors.contains(&SubmissionRequirement::MissingCategory));
    }

    #[test]
    fn complete_campaign_has_no_errors() {
        let mut draft = empty_draft();
        draft.title = "Clean water for Kibera".to_string();
        draft.story_markdown = "a".repeat(MIN_STORY_CHARS);
        draft.category = Some("community".to_string());
        draft.budget_breakdown = vec![BudgetItem {
            item: "Pump".to_string(),
            amount: 5_000,
            description: None,
        }];
        draft.media = vec![MediaItem {
            url: "https://cdn.example.org/pump.jpg".to_string(),
            kind: MediaKind::Image,
        }];
        let campaign = Campaign::new_draft(UserId::new(), draft);
        assert!(campaign.submission_errors().is_empty());
    }

    #[test]
    fn status_transitions_follow_lifecycle() {
        use CampaignStatus::*;
        assert!(Draft.can_transition_to(PendingReview));
        assert!(!Draft.can_transition_to(Funding));
        assert!(PendingReview.can_transition_to(Funding));
        assert!(PendingReview.can_transition_to(Rejected));
        assert!(PendingReview.can_transition_to(PendingReview));
        assert!(Funding.can_transition_to(Funded));
        assert!(!Rejected.can_transition_to(PendingReview));
        assert!(Rejected.is_terminal());
        assert!(!Funding.is_terminal());
    }

    #[test]
    fn status_string_round_trip() {
        for status in [
            CampaignStatus::Draft,
            CampaignStatus::PendingReview,
            CampaignStatus::Funding,
            CampaignStatus::Funded,
            CampaignStatus::Completed,
            CampaignStatus::Cancelled,
            CampaignStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<CampaignStatus>(), Ok(status));
        }
        assert!("LIVE".parse::<CampaignStatus>().is_err());
    }

    #[test]
    fn editable_while_changes_requested() {
        let mut campaign = Campaign::new_draft(UserId::new(), empty_draft());
        assert!(campaign.is_editable());
        campaign.status = CampaignStatus::PendingReview;
        assert!(!campaign.is_editable());
        campaign.changes_requested = true;
        assert!(campaign.is_editable());
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let mut campaign = Campaign::new_draft(UserId::new(), empty_draft());
        campaign.apply(CampaignPatch {
            title: Some("A brand new title".to_string()),
            ..CampaignPatch::default()
        });
        assert_eq!(campaign.title, "A brand new title");
        assert_eq!(campaign.goal_amount, 10_000);
    }
}
