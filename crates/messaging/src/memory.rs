//! In-memory broker for tests and local development.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{BrokerChannel, BrokerError, ChannelProvider, EventEnvelope};

/// Which broker operation should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Everything succeeds.
    #[default]
    None,
    /// Acquiring a channel fails, as if the broker were unreachable.
    Connect,
    /// Declaring a topic fails.
    DeclareTopic,
    /// Publishing a message fails.
    Publish,
}

/// A message accepted by the in-memory broker.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: String,
    pub routing_key: String,
    pub payload: Vec<u8>,
}

impl PublishedMessage {
    /// Parses the payload as an envelope of `E`.
    pub fn envelope<E: DeserializeOwned>(&self) -> Result<EventEnvelope<E>, serde_json::Error> {
        EventEnvelope::from_slice(&self.payload)
    }

    /// Parses the payload as untyped JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

#[derive(Debug, Default)]
struct BrokerState {
    topics: HashSet<String>,
    messages: Vec<PublishedMessage>,
    failure: FailureMode,
    publish_delay: Option<Duration>,
    channels_opened: usize,
}

/// Broker that keeps declared topics and delivered messages in memory.
///
/// Behaves like a topic exchange that rejects publishes to undeclared
/// topics. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryBroker {
    /// Creates an empty broker with no failures configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the given operation fail until reset with [`FailureMode::None`].
    pub fn set_failure(&self, failure: FailureMode) {
        self.lock().failure = failure;
    }

    /// Delays every publish by `delay`.
    pub fn set_publish_delay(&self, delay: Option<Duration>) {
        self.lock().publish_delay = delay;
    }

    /// Returns the messages accepted so far, oldest first.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.lock().messages.clone()
    }

    /// Returns the messages published with `routing_key`.
    pub fn published_with_key(&self, routing_key: &str) -> Vec<PublishedMessage> {
        self.lock()
            .messages
            .iter()
            .filter(|m| m.routing_key == routing_key)
            .cloned()
            .collect()
    }

    /// Returns true if `topic` has been declared.
    pub fn has_topic(&self, topic: &str) -> bool {
        self.lock().topics.contains(topic)
    }

    /// Returns how many channels have been opened.
    pub fn channels_opened(&self) -> usize {
        self.lock().channels_opened
    }

    /// Drops all topics and messages.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.topics.clear();
        state.messages.clear();
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        // A panic while holding the lock leaves the state usable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ChannelProvider for InMemoryBroker {
    async fn acquire(&self) -> Result<Box<dyn BrokerChannel>, BrokerError> {
        let mut state = self.lock();
        if state.failure == FailureMode::Connect {
            return Err(BrokerError::Connection("in-memory broker offline".to_string()));
        }
        state.channels_opened += 1;
        Ok(Box::new(InMemoryChannel {
            broker: self.clone(),
        }))
    }
}

struct InMemoryChannel {
    broker: InMemoryBroker,
}

#[async_trait]
impl BrokerChannel for InMemoryChannel {
    async fn declare_topic(&self, topic: &str) -> Result<(), BrokerError> {
        let mut state = self.broker.lock();
        if state.failure == FailureMode::DeclareTopic {
            return Err(BrokerError::DeclareTopic {
                topic: topic.to_string(),
                reason: "declaration refused".to_string(),
            });
        }
        state.topics.insert(topic.to_string());
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        routing_key: &str,
        payload: Vec<u8>,
    ) -> Result<(), BrokerError> {
        let delay = self.broker.lock().publish_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.broker.lock();
        if state.failure == FailureMode::Publish {
            return Err(BrokerError::Publish("publish refused".to_string()));
        }
        if !state.topics.contains(topic) {
            return Err(BrokerError::Publish(format!("topic {topic} is not declared")));
        }
        state.messages.push(PublishedMessage {
            topic: topic.to_string(),
            routing_key: routing_key.to_string(),
            payload,
        });
        Ok(())
    }
}
