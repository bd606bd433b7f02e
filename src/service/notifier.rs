//! Owner notifications.
//!
//! Notifications are fire-and-forget: a failed delivery is logged and never
//! fails the operation that triggered it.

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{Campaign, CampaignEvent, EventBus};
use crate::error::ServiceError;

/// Delivers messages to campaign owners.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Sends `message` to the owner of `campaign`.
    async fn notify_owner(&self, campaign: &Campaign, message: &str) -> Result<(), ServiceError>;
}

/// Publishes notifications as [`CampaignEvent::OwnerNotified`] on the bus.
#[derive(Debug, Clone)]
pub struct BusNotifier {
    event_bus: EventBus,
}

impl BusNotifier {
    /// Creates a notifier publishing on `event_bus`.
    #[must_use]
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }
}

#[async_trait]
impl Notifier for BusNotifier {
    async fn notify_owner(&self, campaign: &Campaign, message: &str) -> Result<(), ServiceError> {
        let _ = self.event_bus.publish(CampaignEvent::OwnerNotified {
            campaign_id: campaign.id,
            owner_id: campaign.owner_id,
            message: message.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }
}

/// Sends a notification, logging instead of propagating failures.
pub(crate) async fn notify_quietly(notifier: &dyn Notifier, campaign: &Campaign, message: &str) {
    if let Err(err) = notifier.notify_owner(campaign, message).await {
        tracing::warn!(campaign_id = %campaign.id, error = %err, "owner notification failed");
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{CampaignDraft, UserId};

    #[derive(Debug)]
    struct Broken;

    #[async_trait]
    impl Notifier for Broken {
        async fn notify_owner(&self, _: &Campaign, _: &str) -> Result<(), ServiceError> {
            Err(ServiceError::Unavailable("smtp down".to_string()))
        }
    }

    fn campaign() -> Campaign {
        Campaign::new_draft(
            UserId::new(),
            CampaignDraft {
                title: "Books for the library".to_string(),
                story_markdown: String::new(),
                category: None,
                goal_amount: 1_000,
                currency: "usd".to_string(),
                media: Vec::new(),
                budget_breakdown: Vec::new(),
                beneficiaries: Vec::new(),
            },
        )
    }

    #[tokio::test]
    async fn bus_notifier_publishes_owner_event() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let campaign = campaign();

        notify_quietly(&BusNotifier::new(bus), &campaign, "approved").await;

        let Ok(CampaignEvent::OwnerNotified {
            owner_id, message, ..
        }) = rx.recv().await
        else {
            panic!("expected OwnerNotified");
        };
        assert_eq!(owner_id, campaign.owner_id);
        assert_eq!(message, "approved");
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        notify_quietly(&Broken, &campaign(), "hello").await;
    }
}
