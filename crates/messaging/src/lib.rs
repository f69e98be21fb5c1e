//! Post-commit event publishing.
//!
//! Services call [`EventPublisher`] after their own write has been persisted
//! to announce what happened to other services through a topic-based
//! message broker. Delivery is best-effort and at-most-once: a broker that is
//! missing, unreachable or misbehaving is logged and counted, never reported
//! back to the caller.
//!
//! ## Broker channels
//!
//! - **NatsChannelProvider**: NATS JetStream, one durable stream per topic
//! - **InMemoryBroker**: records deliveries in memory, with failure injection
//!   for tests and local development
//!
//! A publisher built with [`EventPublisher::disabled`] has no channel at all
//! and every publish is a no-op.
//!
//! ## Usage
//!
//! ```rust
//! use common::{AggregateId, TenantId};
//! use messaging::{EventEnvelope, EventPublisher, InMemoryBroker, IntegrationEvent};
//! use serde::Serialize;
//! use std::sync::Arc;
//!
//! #[derive(Serialize)]
//! struct InvoiceSent {
//!     invoice_number: String,
//! }
//!
//! impl IntegrationEvent for InvoiceSent {
//!     const TOPIC: &'static str = "billing-events";
//!     const EVENT_TYPE: &'static str = "invoice.sent";
//! }
//!
//! # async fn example() {
//! let broker = InMemoryBroker::new();
//! let publisher = EventPublisher::new(Arc::new(broker.clone()));
//!
//! let envelope = EventEnvelope::new(
//!     TenantId::new("acme"),
//!     AggregateId::new(),
//!     InvoiceSent { invoice_number: "INV-7".to_string() },
//! );
//! publisher.publish_event(&envelope).await;
//!
//! assert_eq!(broker.published()[0].routing_key, "invoice.sent");
//! # }
//! ```

mod channel;
mod envelope;
mod error;
mod memory;
mod nats;
mod publisher;

pub use channel::{BrokerChannel, ChannelProvider};
pub use envelope::{
    ENVELOPE_FIELDS, ENVELOPE_VERSION, EventEnvelope, IntegrationEvent, colliding_fields,
};
pub use error::BrokerError;
pub use memory::{FailureMode, InMemoryBroker, PublishedMessage};
pub use nats::{NatsChannel, NatsChannelProvider};
pub use publisher::{DEFAULT_PUBLISH_TIMEOUT, EventPublisher, PublishOutcome, PublisherConfig};
