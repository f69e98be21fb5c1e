use std::collections::HashSet;

use async_trait::async_trait;

use crate::{AggregateId, Entity, EntityRecord, Result, StoreError, TenantId};

/// A single pending write.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Insert a new record; fails if the ID already exists.
    Insert(EntityRecord),

    /// Replace an existing record owned by the same tenant.
    Update(EntityRecord),
}

impl Change {
    /// Returns the record this change writes.
    pub fn record(&self) -> &EntityRecord {
        match self {
            Change::Insert(record) | Change::Update(record) => record,
        }
    }
}

/// Writes staged by a handler and committed together by [`EntityStore::save`].
///
/// Nothing reaches the store until the change set is saved.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Creates an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a new entity for insertion.
    pub fn add<E: Entity>(&mut self, entity: &E) -> Result<()> {
        self.changes
            .push(Change::Insert(EntityRecord::from_entity(entity)?));
        Ok(())
    }

    /// Stages a modified entity for replacement.
    pub fn update<E: Entity>(&mut self, entity: &E) -> Result<()> {
        self.changes
            .push(Change::Update(EntityRecord::from_entity(entity)?));
        Ok(())
    }

    /// Returns the staged changes in order.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Consumes the change set, returning the staged changes.
    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }

    /// Returns the number of staged changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns true when nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Checks the change set before it is written.
    ///
    /// A change set must not be empty and may touch each entity at most once.
    pub fn validate(&self) -> Result<()> {
        if self.changes.is_empty() {
            return Err(StoreError::InvalidChangeSet(
                "Cannot save an empty change set".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.changes.len());
        for change in &self.changes {
            let record = change.record();
            if record.tenant_id.is_blank() {
                return Err(StoreError::InvalidChangeSet(format!(
                    "{} {} has no tenant",
                    record.entity_type, record.id
                )));
            }
            if !seen.insert((record.entity_type.as_str(), record.id)) {
                return Err(StoreError::InvalidChangeSet(format!(
                    "{} {} appears more than once",
                    record.entity_type, record.id
                )));
            }
        }

        Ok(())
    }
}

/// Durable, tenant-scoped storage for business entities.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Commits every change in the set atomically: either all are written or none.
    async fn save(&self, changes: ChangeSet) -> Result<()>;

    /// Loads a record by type and ID.
    ///
    /// Returns None when the record does not exist or belongs to another tenant.
    async fn find_record(
        &self,
        tenant_id: &TenantId,
        entity_type: &str,
        id: AggregateId,
    ) -> Result<Option<EntityRecord>>;
}

/// Extension trait providing typed access on top of [`EntityStore`].
#[async_trait]
pub trait EntityStoreExt: EntityStore {
    /// Loads and deserializes an entity owned by `tenant_id`.
    async fn find_by_id<E: Entity>(
        &self,
        tenant_id: &TenantId,
        id: AggregateId,
    ) -> Result<Option<E>> {
        match self.find_record(tenant_id, E::ENTITY_TYPE, id).await? {
            Some(record) => Ok(Some(record.into_entity()?)),
            None => Ok(None),
        }
    }

    /// Stages and saves a single new entity.
    async fn insert<E: Entity>(&self, entity: &E) -> Result<()> {
        let mut changes = ChangeSet::new();
        changes.add(entity)?;
        self.save(changes).await
    }
}

// Blanket implementation for all EntityStore implementations
impl<T: EntityStore + ?Sized> EntityStoreExt for T {}
