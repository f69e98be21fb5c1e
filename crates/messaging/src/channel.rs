use async_trait::async_trait;

use crate::BrokerError;

/// An open channel to the message broker.
///
/// Channels are short-lived: the publisher acquires one per publish attempt
/// and drops it afterwards.
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    /// Declares a durable topic. Must be idempotent.
    async fn declare_topic(&self, topic: &str) -> Result<(), BrokerError>;

    /// Publishes a serialized message to `topic` with `routing_key`.
    async fn publish(
        &self,
        topic: &str,
        routing_key: &str,
        payload: Vec<u8>,
    ) -> Result<(), BrokerError>;
}

/// Source of broker channels.
///
/// Wrapped in an `Option` by the publisher: having no provider at all is a
/// supported configuration, not an error.
#[async_trait]
pub trait ChannelProvider: Send + Sync {
    /// Opens a fresh channel.
    async fn acquire(&self) -> Result<Box<dyn BrokerChannel>, BrokerError>;
}
