//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::MatchEvent;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Confirmed-state changes (advance, rewind, resync)
    State,
    /// Local predictions and their rollbacks
    Action,
    /// Consistency faults
    Fault,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::State, Topic::Action, Topic::Fault];

    const fn index(self) -> usize {
        match self {
            Topic::State => 0,
            Topic::Action => 1,
            Topic::Fault => 2,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<[broadcast::Sender<MatchEvent>; 3]>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let channels = Topic::ALL.map(|_| broadcast::channel(capacity).0);
        Self {
            channels: Arc::new(channels),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: MatchEvent) {
        let topic = event.topic();
        if self.channels[topic.index()].send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!(target: "runtime::worker", ?topic, "no subscribers");
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<MatchEvent> {
        self.channels[topic.index()].subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<MatchEvent>> {
        topics.iter().map(|&topic| (topic, self.subscribe(topic))).collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_reach_only_their_topic() {
        let bus = EventBus::with_capacity(4);
        let mut faults = bus.subscribe(Topic::Fault);
        let mut states = bus.subscribe(Topic::State);

        bus.publish(MatchEvent::ConsistencyFault {
            sequence_number: 3,
            detail: "conflict".to_string(),
        });

        assert!(matches!(
            faults.recv().await.unwrap(),
            MatchEvent::ConsistencyFault { sequence_number: 3, .. }
        ));
        assert!(states.try_recv().is_err());
    }
}
