use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use serde::Serialize;

use crate::{BrokerError, ChannelProvider, EventEnvelope, IntegrationEvent};

/// Upper bound on a single publish attempt unless configured otherwise.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Publisher settings.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Bound on acquire + declare + serialize + publish. Elapsing it counts as a failure.
    pub publish_timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }
}

/// What happened to one publish attempt.
///
/// Only for logs, metrics and tests. Command results never carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// No broker is configured; nothing was attempted.
    BrokerAbsent,
    /// The broker accepted the message.
    Published,
    /// The attempt failed and was logged. There is no retry.
    Failed,
}

/// Best-effort publisher of integration events.
///
/// [`publish`](Self::publish) never fails from the caller's point of view:
/// every broker failure is logged once at `WARN` with the topic, routing
/// key and aggregate id, counted, and dropped.
#[derive(Clone)]
pub struct EventPublisher {
    provider: Option<Arc<dyn ChannelProvider>>,
    config: PublisherConfig,
}

impl EventPublisher {
    /// Creates a publisher that sends through `provider`.
    pub fn new(provider: Arc<dyn ChannelProvider>) -> Self {
        Self::with_config(Some(provider), PublisherConfig::default())
    }

    /// Creates a publisher with no broker. Every publish is a no-op.
    pub fn disabled() -> Self {
        Self::with_config(None, PublisherConfig::default())
    }

    /// Creates a publisher from an optional provider and explicit settings.
    pub fn with_config(provider: Option<Arc<dyn ChannelProvider>>, config: PublisherConfig) -> Self {
        Self { provider, config }
    }

    /// Returns true when a broker channel provider is configured.
    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Publishes an envelope to its event type's topic and routing key.
    pub async fn publish_event<E: IntegrationEvent>(
        &self,
        envelope: &EventEnvelope<E>,
    ) -> PublishOutcome {
        self.publish(E::TOPIC, E::EVENT_TYPE, envelope).await
    }

    /// Publishes an envelope to `topic` with `routing_key`.
    ///
    /// Declares the topic, serializes the envelope and publishes it on a
    /// freshly acquired channel. Failures are logged and swallowed.
    pub async fn publish<E: Serialize + Sync>(
        &self,
        topic: &str,
        routing_key: &str,
        envelope: &EventEnvelope<E>,
    ) -> PublishOutcome {
        let Some(provider) = self.provider.as_deref() else {
            metrics::counter!("event_publish_skipped_total", "topic" => topic.to_string())
                .increment(1);
            return PublishOutcome::BrokerAbsent;
        };

        let started = Instant::now();
        let attempt = AssertUnwindSafe(attempt_publish(provider, topic, routing_key, envelope))
            .catch_unwind();

        let result = match tokio::time::timeout(self.config.publish_timeout, attempt).await {
            Ok(Ok(result)) => result,
            Ok(Err(_panic)) => Err(BrokerError::Panicked),
            Err(_elapsed) => Err(BrokerError::Timeout(self.config.publish_timeout)),
        };

        metrics::histogram!("event_publish_duration_seconds", "topic" => topic.to_string())
            .record(started.elapsed().as_secs_f64());

        match result {
            Ok(()) => {
                metrics::counter!(
                    "events_published_total",
                    "topic" => topic.to_string(),
                    "event_type" => routing_key.to_string()
                )
                .increment(1);
                PublishOutcome::Published
            }
            Err(error) => {
                metrics::counter!(
                    "event_publish_failures_total",
                    "topic" => topic.to_string(),
                    "event_type" => routing_key.to_string(),
                    "stage" => error.stage()
                )
                .increment(1);
                tracing::warn!(
                    topic,
                    routing_key,
                    aggregate_id = %envelope.aggregate_id,
                    tenant_id = %envelope.tenant_id,
                    stage = error.stage(),
                    %error,
                    "event publish failed"
                );
                PublishOutcome::Failed
            }
        }
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("enabled", &self.is_enabled())
            .field("config", &self.config)
            .finish()
    }
}

async fn attempt_publish<E: Serialize + Sync>(
    provider: &dyn ChannelProvider,
    topic: &str,
    routing_key: &str,
    envelope: &EventEnvelope<E>,
) -> Result<(), BrokerError> {
    let channel = provider.acquire().await?;
    channel.declare_topic(topic).await?;
    let payload = envelope.to_bytes()?;
    channel.publish(topic, routing_key, payload).await
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use common::{AggregateId, TenantId};
    use serde::{Deserialize, Serialize, Serializer};
    use tracing_test::traced_test;

    use super::*;
    use crate::{BrokerChannel, FailureMode, InMemoryBroker};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct BadgePrinted {
        badge_number: String,
    }

    impl IntegrationEvent for BadgePrinted {
        const TOPIC: &'static str = "access-events";
        const EVENT_TYPE: &'static str = "badge.printed";
    }

    fn envelope() -> EventEnvelope<BadgePrinted> {
        EventEnvelope::new(
            TenantId::new("acme"),
            AggregateId::new(),
            BadgePrinted {
                badge_number: "B-1".to_string(),
            },
        )
    }

    fn warning_count(lines: &[&str]) -> usize {
        lines
            .iter()
            .filter(|line| line.contains("WARN") && line.contains("event publish failed"))
            .count()
    }

    #[tokio::test]
    async fn disabled_publisher_is_a_no_op() {
        let publisher = EventPublisher::disabled();

        assert!(!publisher.is_enabled());
        assert_eq!(
            publisher.publish_event(&envelope()).await,
            PublishOutcome::BrokerAbsent
        );
    }

    #[tokio::test]
    async fn publishes_with_event_routing_key() {
        let broker = InMemoryBroker::new();
        let publisher = EventPublisher::new(Arc::new(broker.clone()));
        let envelope = envelope();

        let outcome = publisher.publish_event(&envelope).await;

        assert_eq!(outcome, PublishOutcome::Published);
        let published = broker.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "access-events");
        assert_eq!(published[0].routing_key, "badge.printed");
        let delivered: EventEnvelope<BadgePrinted> = published[0].envelope().unwrap();
        assert_eq!(delivered.aggregate_id, envelope.aggregate_id);
    }

    #[tokio::test]
    async fn declares_topic_before_publishing() {
        let broker = InMemoryBroker::new();
        let publisher = EventPublisher::new(Arc::new(broker.clone()));

        publisher.publish_event(&envelope()).await;
        publisher.publish_event(&envelope()).await;

        assert!(broker.has_topic("access-events"));
        assert_eq!(broker.published().len(), 2);
    }

    #[tokio::test]
    async fn acquires_a_fresh_channel_per_attempt() {
        let broker = InMemoryBroker::new();
        let publisher = EventPublisher::new(Arc::new(broker.clone()));

        publisher.publish_event(&envelope()).await;
        publisher.publish_event(&envelope()).await;

        assert_eq!(broker.channels_opened(), 2);
    }

    #[traced_test]
    #[tokio::test]
    async fn declare_failure_is_logged_not_raised() {
        let broker = InMemoryBroker::new();
        broker.set_failure(FailureMode::DeclareTopic);
        let publisher = EventPublisher::new(Arc::new(broker.clone()));
        let envelope = envelope();

        let outcome = publisher.publish_event(&envelope).await;

        assert_eq!(outcome, PublishOutcome::Failed);
        assert!(broker.published().is_empty());
        assert!(logs_contain("badge.printed"));
        assert!(logs_contain(&envelope.aggregate_id.to_string()));
        logs_assert(|lines: &[&str]| match warning_count(lines) {
            1 => Ok(()),
            n => Err(format!("expected one warning, found {n}")),
        });
    }

    #[traced_test]
    #[tokio::test]
    async fn connect_and_publish_failures_are_swallowed() {
        let broker = InMemoryBroker::new();
        let publisher = EventPublisher::new(Arc::new(broker.clone()));

        broker.set_failure(FailureMode::Connect);
        assert_eq!(
            publisher.publish_event(&envelope()).await,
            PublishOutcome::Failed
        );

        broker.set_failure(FailureMode::Publish);
        assert_eq!(
            publisher.publish_event(&envelope()).await,
            PublishOutcome::Failed
        );

        assert!(broker.published().is_empty());
        logs_assert(|lines: &[&str]| match warning_count(lines) {
            2 => Ok(()),
            n => Err(format!("expected two warnings, found {n}")),
        });
    }

    #[traced_test]
    #[tokio::test]
    async fn success_logs_nothing() {
        let broker = InMemoryBroker::new();
        let publisher = EventPublisher::new(Arc::new(broker));

        publisher.publish_event(&envelope()).await;

        assert!(!logs_contain("event publish failed"));
    }

    #[derive(Debug)]
    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("payload cannot be encoded"))
        }
    }

    #[traced_test]
    #[tokio::test]
    async fn serialization_failure_is_swallowed() {
        let broker = InMemoryBroker::new();
        let publisher = EventPublisher::new(Arc::new(broker.clone()));
        let envelope = EventEnvelope {
            envelope_version: 1,
            event_type: "badge.printed".to_string(),
            tenant_id: TenantId::new("acme"),
            aggregate_id: AggregateId::new(),
            occurred_at: chrono::Utc::now(),
            payload: Unserializable,
        };

        let outcome = publisher
            .publish("access-events", "badge.printed", &envelope)
            .await;

        assert_eq!(outcome, PublishOutcome::Failed);
        assert!(broker.published().is_empty());
        assert!(logs_contain("serialize"));
    }

    #[traced_test]
    #[tokio::test]
    async fn slow_broker_times_out() {
        let broker = InMemoryBroker::new();
        broker.set_publish_delay(Some(Duration::from_millis(200)));
        let publisher = EventPublisher::with_config(
            Some(Arc::new(broker.clone())),
            PublisherConfig {
                publish_timeout: Duration::from_millis(20),
            },
        );

        let outcome = publisher.publish_event(&envelope()).await;

        assert_eq!(outcome, PublishOutcome::Failed);
        assert!(logs_contain("timeout"));
    }

    struct PanickingProvider;

    #[async_trait]
    impl ChannelProvider for PanickingProvider {
        async fn acquire(&self) -> Result<Box<dyn BrokerChannel>, BrokerError> {
            panic!("driver bug");
        }
    }

    #[traced_test]
    #[tokio::test]
    async fn panicking_channel_is_contained() {
        let publisher = EventPublisher::new(Arc::new(PanickingProvider));

        let outcome = publisher.publish_event(&envelope()).await;

        assert_eq!(outcome, PublishOutcome::Failed);
        assert!(logs_contain("panicked"));
    }
}
