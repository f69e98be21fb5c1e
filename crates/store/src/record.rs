use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{AggregateId, Result, TenantId};

/// A business entity that can be persisted by an [`EntityStore`](crate::EntityStore).
///
/// Entities are always owned by exactly one tenant. The store never reads
/// or writes an entity on behalf of a different tenant.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Stable type name used to partition stored records (e.g. "receipt").
    const ENTITY_TYPE: &'static str;

    /// Returns the entity's unique identifier.
    fn id(&self) -> AggregateId;

    /// Returns the tenant that owns the entity.
    fn tenant_id(&self) -> &TenantId;
}

/// A stored entity document together with its identifying columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// The entity's unique identifier.
    pub id: AggregateId,

    /// The owning tenant.
    pub tenant_id: TenantId,

    /// The entity type (see [`Entity::ENTITY_TYPE`]).
    pub entity_type: String,

    /// The serialized entity.
    pub body: serde_json::Value,

    /// When this version of the record was written.
    pub stored_at: DateTime<Utc>,
}

impl EntityRecord {
    /// Serializes an entity into a record stamped with the current time.
    pub fn from_entity<E: Entity>(entity: &E) -> Result<Self> {
        Ok(Self {
            id: entity.id(),
            tenant_id: entity.tenant_id().clone(),
            entity_type: E::ENTITY_TYPE.to_string(),
            body: serde_json::to_value(entity)?,
            stored_at: Utc::now(),
        })
    }

    /// Deserializes the record body back into an entity.
    pub fn into_entity<E: Entity>(self) -> Result<E> {
        Ok(serde_json::from_value(self.body)?)
    }
}
