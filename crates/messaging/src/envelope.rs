//! # Event Envelope
//!
//! The message every service sends to the broker after a successful write.
//!
//! ## Wire shape
//!
//! A flat JSON document: the envelope fields sit next to the event's own
//! payload fields.
//!
//! ```json
//! {
//!   "envelope_version": 1,
//!   "event_type": "receipt.uploaded",
//!   "tenant_id": "T1",
//!   "aggregate_id": "5b0d7c8e-…",
//!   "occurred_at": "2026-10-18T09:12:44.118Z",
//!   "file_name": "x.pdf"
//! }
//! ```
//!
//! Consumers route on `event_type` (which is also the routing key) and
//! deduplicate on `(tenant_id, aggregate_id, event_type)`. There is no
//! separate event id.

use chrono::{DateTime, Utc};
use common::{AggregateId, TenantId};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Version of the envelope shape. Bumped only if the envelope fields change.
pub const ENVELOPE_VERSION: u32 = 1;

/// Field names owned by the envelope. Event payloads must not use them.
pub const ENVELOPE_FIELDS: [&str; 5] = [
    "envelope_version",
    "event_type",
    "tenant_id",
    "aggregate_id",
    "occurred_at",
];

/// Returns the envelope field names that `payload` would also write.
///
/// A non-empty result means the flat document would carry duplicate keys.
pub fn colliding_fields<E: Serialize>(payload: &E) -> Vec<&'static str> {
    match serde_json::to_value(payload) {
        Ok(serde_json::Value::Object(fields)) => ENVELOPE_FIELDS
            .iter()
            .copied()
            .filter(|name| fields.contains_key(*name))
            .collect(),
        _ => Vec::new(),
    }
}

/// A business fact announced to other services.
///
/// The topic and routing key are fixed per event type at compile time and
/// never depend on payload contents, so consumer bindings stay stable.
/// Payload field names must not collide with the envelope's own fields.
pub trait IntegrationEvent: Serialize + Send + Sync {
    /// Topic (exchange) of the publishing service, `"<service>-events"`.
    const TOPIC: &'static str;

    /// Stable event name, `"<entity>.<past-tense-verb>"`; doubles as routing key.
    const EVENT_TYPE: &'static str;
}

/// Envelope wrapping an integration event with its identifying fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    /// Envelope shape version ([`ENVELOPE_VERSION`]).
    pub envelope_version: u32,

    /// Event name, e.g. `receipt.uploaded`.
    pub event_type: String,

    /// Tenant that owns the changed entity.
    pub tenant_id: TenantId,

    /// The entity that changed.
    pub aggregate_id: AggregateId,

    /// When the publish was attempted.
    pub occurred_at: DateTime<Utc>,

    /// Event-specific fields, flattened into the document.
    #[serde(flatten)]
    pub payload: E,
}

impl<E: IntegrationEvent> EventEnvelope<E> {
    /// Creates an envelope stamped with the current time.
    ///
    /// Build the envelope only once the entity has been persisted: the
    /// timestamp records the publish attempt, not the write.
    pub fn new(tenant_id: TenantId, aggregate_id: AggregateId, payload: E) -> Self {
        debug_assert!(
            colliding_fields(&payload).is_empty(),
            "{} payload reuses envelope fields {:?}",
            E::EVENT_TYPE,
            colliding_fields(&payload)
        );
        Self {
            envelope_version: ENVELOPE_VERSION,
            event_type: E::EVENT_TYPE.to_string(),
            tenant_id,
            aggregate_id,
            occurred_at: Utc::now(),
            payload,
        }
    }

    /// The topic this envelope is published to.
    pub fn topic(&self) -> &'static str {
        E::TOPIC
    }

    /// The routing key this envelope is published with.
    pub fn routing_key(&self) -> &'static str {
        E::EVENT_TYPE
    }
}

impl<E: Serialize> EventEnvelope<E> {
    /// Serializes the envelope to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl<E: DeserializeOwned> EventEnvelope<E> {
    /// Parses an envelope from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct ParcelShipped {
        carrier: String,
        tracking_number: String,
    }

    impl IntegrationEvent for ParcelShipped {
        const TOPIC: &'static str = "shipping-events";
        const EVENT_TYPE: &'static str = "parcel.shipped";
    }

    fn envelope() -> EventEnvelope<ParcelShipped> {
        EventEnvelope::new(
            TenantId::new("acme"),
            AggregateId::new(),
            ParcelShipped {
                carrier: "UPS".to_string(),
                tracking_number: "1Z999".to_string(),
            },
        )
    }

    #[test]
    fn new_envelope_takes_type_and_version_from_event() {
        let envelope = envelope();

        assert_eq!(envelope.envelope_version, ENVELOPE_VERSION);
        assert_eq!(envelope.event_type, "parcel.shipped");
        assert_eq!(envelope.routing_key(), "parcel.shipped");
        assert_eq!(envelope.topic(), "shipping-events");
    }

    #[test]
    fn serialized_document_is_flat() {
        let envelope = envelope();
        let json: serde_json::Value =
            serde_json::from_slice(&envelope.to_bytes().unwrap()).unwrap();

        assert_eq!(json["tenant_id"], "acme");
        assert_eq!(json["aggregate_id"], envelope.aggregate_id.to_string());
        assert_eq!(json["event_type"], "parcel.shipped");
        assert_eq!(json["carrier"], "UPS");
        assert_eq!(json["tracking_number"], "1Z999");
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn consumers_can_parse_the_document() {
        let envelope = envelope();
        let parsed: EventEnvelope<ParcelShipped> =
            EventEnvelope::from_slice(&envelope.to_bytes().unwrap()).unwrap();

        assert_eq!(parsed, envelope);
    }

    #[derive(Debug, Serialize)]
    struct TenantMoved {
        tenant_id: String,
        region: String,
    }

    impl IntegrationEvent for TenantMoved {
        const TOPIC: &'static str = "tenancy-events";
        const EVENT_TYPE: &'static str = "tenant.moved";
    }

    #[test]
    fn payload_reusing_envelope_fields_is_detected() {
        let payload = TenantMoved {
            tenant_id: "other".to_string(),
            region: "eu".to_string(),
        };

        assert_eq!(colliding_fields(&payload), vec!["tenant_id"]);
        assert!(colliding_fields(&envelope().payload).is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "reuses envelope fields")]
    fn colliding_payload_is_rejected_in_debug_builds() {
        let _ = EventEnvelope::new(
            TenantId::new("acme"),
            AggregateId::new(),
            TenantMoved {
                tenant_id: "other".to_string(),
                region: "eu".to_string(),
            },
        );
    }

    #[test]
    fn occurred_at_is_stamped_at_construction() {
        let before = Utc::now();
        let envelope = envelope();
        let after = Utc::now();

        assert!(envelope.occurred_at >= before && envelope.occurred_at <= after);
    }
}
