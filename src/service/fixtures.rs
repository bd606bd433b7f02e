//! Shared service test fixtures.

use std::sync::Arc;
use std::time::Duration;

use crate::content::{ContentChecker, KeywordLists};
use crate::domain::{
    Actor, BudgetItem, CampaignDraft, EventBus, MediaItem, MediaKind, Role, UserId,
};
use crate::persistence::{CampaignRepository, InMemoryRepository};
use crate::service::payment::mock::MockProcessor;
use crate::service::{
    BusNotifier, DonationService, ModerationPolicy, ModerationService, PaymentProcessor,
    RetryPolicy, TrustService,
};
use crate::trust::TrustWeights;

pub(crate) const STORY: &str = "Our community well in Kisumu collapsed during the spring floods. \
    Three hundred families now walk more than two hours each day to reach clean water. \
    We have partnered with a registered local contractor who has already surveyed the site. \
    The budget below covers drilling, a solar pump, and a concrete apron around the well head. \
    Every purchase will be documented with receipts, and we will post photos of each stage. \
    Any money left over will go to the school water tank next door. \
    Thank you for reading and for sharing our story with friends.";

pub(crate) fn complete_draft() -> CampaignDraft {
    CampaignDraft {
        title: "Rebuild the Kisumu community well".to_string(),
        story_markdown: STORY.to_string(),
        category: Some("community".to_string()),
        goal_amount: 10_000,
        currency: "USD".to_string(),
        media: vec![MediaItem {
            url: "https://cdn.example.org/well.jpg".to_string(),
            kind: MediaKind::Image,
        }],
        budget_breakdown: vec![BudgetItem {
            item: "Drilling".to_string(),
            amount: 10_000,
            description: None,
        }],
        beneficiaries: Vec::new(),
    }
}

pub(crate) fn empty_draft() -> CampaignDraft {
    CampaignDraft {
        title: String::new(),
        story_markdown: String::new(),
        category: None,
        goal_amount: 10_000,
        currency: "usd".to_string(),
        media: Vec::new(),
        budget_breakdown: Vec::new(),
        beneficiaries: Vec::new(),
    }
}

/// Reservation window used by every service test.
pub(crate) const PENDING_TTL: Duration = Duration::from_secs(30 * 60);

pub(crate) fn actor(role: Role) -> Actor {
    Actor::new(UserId::new(), role)
}

pub(crate) fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
    }
}

/// Every service wired over one in-memory repository.
#[derive(Debug)]
pub(crate) struct Harness {
    pub(crate) repo: Arc<InMemoryRepository>,
    pub(crate) bus: EventBus,
    pub(crate) trust: TrustService,
    pub(crate) moderation: ModerationService,
    pub(crate) donations: DonationService,
    pub(crate) payments: Arc<MockProcessor>,
}

pub(crate) fn harness(policy: ModerationPolicy) -> Harness {
    harness_with_processor(policy, MockProcessor::default())
}

pub(crate) fn harness_with_processor(policy: ModerationPolicy, processor: MockProcessor) -> Harness {
    let repo = Arc::new(InMemoryRepository::new());
    let store: Arc<dyn CampaignRepository> = Arc::clone(&repo) as Arc<dyn CampaignRepository>;
    let bus = EventBus::new(64);
    let retry = fast_retry();
    let trust = TrustService::new(Arc::clone(&store), TrustWeights::default(), retry, bus.clone());
    let checker = match ContentChecker::new(&KeywordLists::default()) {
        Ok(checker) => Arc::new(checker),
        Err(e) => panic!("keyword lists should compile: {e}"),
    };
    let notifier = Arc::new(BusNotifier::new(bus.clone()));
    let moderation = ModerationService::new(
        Arc::clone(&store),
        trust.clone(),
        checker,
        policy,
        notifier,
        bus.clone(),
        retry,
    );
    let payments = Arc::new(processor);
    let donations = DonationService::new(
        store,
        trust.clone(),
        Arc::clone(&payments) as Arc<dyn PaymentProcessor>,
        bus.clone(),
        retry,
        PENDING_TTL,
    );
    Harness {
        repo,
        bus,
        trust,
        moderation,
        donations,
        payments,
    }
}
