//! In-process pub/sub hub for discovery events.
//!
//! Topics are opaque strings; each topic gets its own broadcast channel,
//! created on first subscribe.
//!
//! # Guarantees
//!
//! - **Fire-and-forget**: publishing never waits on subscribers
//! - **At-most-once delivery**: lagging receivers miss events
//! - **No replay**: events published before `subscribe` are not seen

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::event::DiscoveryEvent;

/// Topic on which newly discovered names are announced.
pub const NEW_NAME: &str = "NEWNAME";

/// Default per-topic channel capacity.
const DEFAULT_CAPACITY: usize = 10000;

/// Topic-keyed broadcast hub. Cloning shares the same channels.
#[derive(Clone)]
pub struct DiscoveryBus {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<DiscoveryEvent>>>>,
    capacity: usize,
}

impl DiscoveryBus {
    /// Create a bus with the default per-topic capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus with the given per-topic capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Publish to a topic. Returns the number of receivers reached; zero if
    /// nobody is listening.
    pub async fn publish(&self, topic: &str, event: DiscoveryEvent) -> usize {
        let channels = self.channels.read().await;
        match channels.get(topic) {
            Some(tx) => tx.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Subscribe to a topic, creating its channel if needed.
    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<DiscoveryEvent> {
        let mut channels = self.channels.write().await;
        channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Active receivers on a topic.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.channels
            .read()
            .await
            .get(topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Remove topics with zero subscribers.
    pub async fn cleanup(&self) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, tx| tx.receiver_count() > 0);
    }
}

impl Default for DiscoveryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DiscoveryBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryBus")
            .field("capacity", &self.capacity)
            .finish()
    }
}
