use tokio::sync::broadcast;
use tracing::warn;

use crate::models::change::MatchChange;

const DEFAULT_CAPACITY: usize = 256;

/// Source of per-match change notifications.
///
/// Notifications carry no ordering guarantee across matches and are never
/// replayed, so a subscriber fetches the row after subscribing.
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self, match_id: &str) -> MatchSubscription;
}

#[derive(Clone)]
pub struct BroadcastChangeFeed {
    sender: broadcast::Sender<MatchChange>,
}

impl Default for BroadcastChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BroadcastChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns the number of live subscriptions that were sent the change.
    pub fn publish(&self, change: MatchChange) -> usize {
        // No subscribers is not an error for a fan-out.
        self.sender.send(change).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl ChangeFeed for BroadcastChangeFeed {
    fn subscribe(&self, match_id: &str) -> MatchSubscription {
        MatchSubscription {
            match_id: match_id.to_string(),
            receiver: self.sender.subscribe(),
        }
    }
}

/// Changes for a single match. Dropping it unsubscribes.
pub struct MatchSubscription {
    match_id: String,
    receiver: broadcast::Receiver<MatchChange>,
}

impl MatchSubscription {
    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    pub async fn recv(&mut self) -> Option<MatchChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.match_id == self.match_id => return Some(change),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "Subscription for match {} lagged, skipped {} changes",
                        self.match_id, skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
