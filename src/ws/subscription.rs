//! Per-connection subscription filter.
//!
//! Tracks which campaigns a WebSocket client follows and filters
//! broadcast events server-side.

use std::collections::HashSet;

use super::messages::CampaignSelection;
use crate::domain::CampaignId;

/// Campaign subscriptions of a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Followed campaigns. Ignored while `subscribe_all` is set.
    campaign_ids: HashSet<CampaignId>,
    /// Wildcard (`"*"`) subscription.
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a manager that matches nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Follows the selected campaigns.
    pub fn subscribe(&mut self, selection: &CampaignSelection) {
        self.subscribe_all |= selection.wildcard;
        self.campaign_ids.extend(selection.ids.iter().copied());
    }

    /// Stops following the selected campaigns. A `"*"` entry clears the
    /// wildcard but keeps explicit ids.
    pub fn unsubscribe(&mut self, selection: &CampaignSelection) {
        if selection.wildcard {
            self.subscribe_all = false;
        }
        for id in &selection.ids {
            self.campaign_ids.remove(id);
        }
    }

    /// Returns `true` if events for `campaign_id` should be delivered.
    #[must_use]
    pub fn matches(&self, campaign_id: CampaignId) -> bool {
        self.subscribe_all || self.campaign_ids.contains(&campaign_id)
    }

    /// Number of explicitly followed campaigns.
    #[must_use]
    pub fn count(&self) -> usize {
        self.campaign_ids.len()
    }

    /// Returns `true` while the wildcard is active.
    #[must_use]
    pub const fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
