//! In-process fan-out of [`CampaignEvent`]s.
//!
//! Services publish only after a write has committed, so a subscriber never
//! sees an event for state that was rolled back. Delivery is best effort: a
//! subscriber that falls more than `capacity` events behind loses the
//! oldest ones and observes `RecvError::Lagged`.

use tokio::sync::broadcast;

use super::CampaignEvent;

/// Cloneable handle to the campaign event channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CampaignEvent>,
}

impl EventBus {
    /// Creates a bus that buffers up to `capacity` events per subscriber.
    ///
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Sends `event` to every live subscriber and returns how many there were.
    ///
    /// Having no subscribers is normal and not an error.
    pub fn publish(&self, event: CampaignEvent) -> usize {
        let kind = event.event_type_str();
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(event_type = kind, delivered, "campaign event published");
        delivered
    }

    /// Opens a receiver for events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CampaignEvent> {
        self.sender.subscribe()
    }

    /// Number of open receivers, reported by `/health` as WebSocket subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
