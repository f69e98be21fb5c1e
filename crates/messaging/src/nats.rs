//! NATS JetStream broker channel.
//!
//! A topic maps to a durable, file-backed JetStream stream bound to
//! `<topic>.>`. A message published to `topic` with `routing_key` goes to
//! subject `<topic>.<routing_key>`, so consumers bind with subject filters
//! such as `receipts-events.receipt.*`.

use async_nats::Client;
use async_nats::connection::State;
use async_nats::jetstream::{self, stream};
use async_trait::async_trait;

use crate::{BrokerChannel, BrokerError, ChannelProvider};

/// Channel provider backed by a connected NATS client.
///
/// # Example
/// ```rust,no_run
/// use messaging::{EventPublisher, NatsChannelProvider};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = NatsChannelProvider::connect("nats://localhost:4222").await?;
/// let publisher = EventPublisher::new(Arc::new(provider));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NatsChannelProvider {
    client: Client,
}

impl NatsChannelProvider {
    /// Wraps an already-connected NATS client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connects to the NATS server at `url`.
    pub async fn connect(url: &str) -> Result<Self, BrokerError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        Ok(Self::new(client))
    }

    /// Returns the underlying NATS client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ChannelProvider for NatsChannelProvider {
    async fn acquire(&self) -> Result<Box<dyn BrokerChannel>, BrokerError> {
        let state = self.client.connection_state();
        if !matches!(state, State::Connected) {
            return Err(BrokerError::Connection(format!("nats client is {state:?}")));
        }
        Ok(Box::new(NatsChannel {
            jetstream: jetstream::new(self.client.clone()),
        }))
    }
}

/// A JetStream context used for one publish attempt.
pub struct NatsChannel {
    jetstream: jetstream::Context,
}

/// JetStream stream names may not contain `.`, `*`, `>` or whitespace.
fn stream_name(topic: &str) -> String {
    topic
        .chars()
        .map(|c| match c {
            '.' | '*' | '>' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

fn subject(topic: &str, routing_key: &str) -> String {
    format!("{topic}.{routing_key}")
}

#[async_trait]
impl BrokerChannel for NatsChannel {
    async fn declare_topic(&self, topic: &str) -> Result<(), BrokerError> {
        self.jetstream
            .get_or_create_stream(stream::Config {
                name: stream_name(topic),
                subjects: vec![format!("{topic}.>")],
                storage: stream::StorageType::File,
                ..Default::default()
            })
            .await
            .map_err(|e| BrokerError::DeclareTopic {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        routing_key: &str,
        payload: Vec<u8>,
    ) -> Result<(), BrokerError> {
        let ack = self
            .jetstream
            .publish(subject(topic, routing_key), payload.into())
            .await
            .map_err(|e| BrokerError::Publish(e.to_string()))?;

        ack.await.map_err(|e| BrokerError::Publish(e.to_string()))?;
        Ok(())
    }
}
