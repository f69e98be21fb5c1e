use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EntityRecord, Result, StoreError, TenantId,
    store::{Change, ChangeSet, EntityStore},
};

type RecordKey = (String, AggregateId);

/// In-memory entity store for tests and local development.
///
/// Provides the same contract as the PostgreSQL implementation, plus a
/// switch to make every save fail so callers can exercise their
/// persistence-failure paths.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<HashMap<RecordKey, EntityRecord>>>,
    failure: Arc<RwLock<Option<String>>>,
    save_attempts: Arc<AtomicUsize>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent save fail with [`StoreError::Unavailable`].
    pub async fn fail_saves(&self, reason: impl Into<String>) {
        *self.failure.write().await = Some(reason.into());
    }

    /// Restores normal save behaviour.
    pub async fn recover(&self) {
        *self.failure.write().await = None;
    }

    /// Returns how many times `save` has been called, successful or not.
    pub fn save_attempts(&self) -> usize {
        self.save_attempts.load(Ordering::SeqCst)
    }

    /// Returns the total number of stored records.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn save(&self, changes: ChangeSet) -> Result<()> {
        self.save_attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = self.failure.read().await.clone() {
            return Err(StoreError::Unavailable(reason));
        }

        changes.validate()?;

        let mut records = self.records.write().await;

        // Check every change before writing anything so the save stays atomic
        for change in changes.changes() {
            let record = change.record();
            let key = (record.entity_type.clone(), record.id);
            match change {
                Change::Insert(_) if records.contains_key(&key) => {
                    return Err(StoreError::DuplicateId {
                        entity_type: record.entity_type.clone(),
                        id: record.id,
                    });
                }
                Change::Update(_) => {
                    let owned = records
                        .get(&key)
                        .is_some_and(|existing| existing.tenant_id == record.tenant_id);
                    if !owned {
                        return Err(StoreError::NotFound {
                            entity_type: record.entity_type.clone(),
                            id: record.id,
                        });
                    }
                }
                Change::Insert(_) => {}
            }
        }

        for change in changes.into_changes() {
            let record = match change {
                Change::Insert(record) | Change::Update(record) => record,
            };
            records.insert((record.entity_type.clone(), record.id), record);
        }

        Ok(())
    }

    async fn find_record(
        &self,
        tenant_id: &TenantId,
        entity_type: &str,
        id: AggregateId,
    ) -> Result<Option<EntityRecord>> {
        let records = self.records.read().await;
        Ok(records
            .get(&(entity_type.to_string(), id))
            .filter(|record| &record.tenant_id == tenant_id)
            .cloned())
    }
}
