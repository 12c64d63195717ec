use crate::traits::EventSink;
use crate::types::SourceKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    ItemCreated {
        kind: SourceKind,
        id: Uuid,
        created_at: DateTime<Utc>,
        category: String,
    },
}

/// Process-wide fan-out of feed events to connected real-time clients.
///
/// The write path publishes here after a successful commit; page composition
/// never reads from it.
#[derive(Clone)]
pub struct FeedEventBus {
    sender: broadcast::Sender<FeedEvent>,
}

impl FeedEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for FeedEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventSink for FeedEventBus {
    fn publish(&self, event: FeedEvent) {
        if self.sender.send(event).is_err() {
            debug!("No subscribers for feed event");
        }
    }
}
