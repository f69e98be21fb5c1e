//! Command handling: validate, persist, then announce.
//!
//! Every state-changing command goes through [`CommandHandler`], which
//! enforces one ordering for all entity types:
//!
//! 1. validate the command (nothing touched on failure),
//! 2. commit the change set atomically,
//! 3. build an envelope and hand it to the [`EventPublisher`].
//!
//! Step 3 only runs after step 2 succeeded, and its outcome never changes
//! the command result. Cancellation is honoured until step 2 completes;
//! after that the command runs to completion.

use common::{AggregateId, TenantId};
use messaging::{EventEnvelope, EventPublisher, IntegrationEvent};
use store::{ChangeSet, Entity, EntityStore, EntityStoreExt};
use tokio_util::sync::CancellationToken;

use crate::error::{CommandError, ValidationError};

/// A request to change one entity.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The entity this command writes.
    type Entity: Entity;

    /// The integration event announced after a successful write.
    type Event: IntegrationEvent;

    /// Command name used in metrics, e.g. `upload_receipt`.
    const NAME: &'static str;

    /// The tenant on whose behalf the command runs.
    fn tenant_id(&self) -> &TenantId;

    /// Checks the command's own inputs. Must not touch the store.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Builds the event payload from the entity as it was persisted.
    fn event(entity: &Self::Entity) -> Self::Event;
}

/// A command that creates a new entity.
pub trait CreateCommand: Command + Sized {
    /// Builds the entity to insert. Only called after [`Command::validate`] passed.
    fn into_entity(self) -> Self::Entity;
}

/// A command that modifies an existing entity.
pub trait UpdateCommand: Command + Sized {
    /// The entity to modify.
    fn aggregate_id(&self) -> AggregateId;

    /// Applies the change, rejecting transitions the entity's state forbids.
    fn apply(self, entity: &mut Self::Entity) -> Result<(), ValidationError>;
}

/// Runs commands against an [`EntityStore`] and announces the results.
///
/// Holds at most one publisher. A disabled publisher turns the announce
/// step into a no-op; the command path is otherwise unchanged.
pub struct CommandHandler<S: EntityStore> {
    store: S,
    publisher: EventPublisher,
}

impl<S: EntityStore> CommandHandler<S> {
    /// Creates a handler writing to `store` and announcing through `publisher`.
    pub fn new(store: S, publisher: EventPublisher) -> Self {
        Self { store, publisher }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the event publisher.
    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    /// Validates `command`, inserts the entity it builds and announces it.
    pub async fn create<C: CreateCommand>(
        &self,
        command: C,
        cancel: &CancellationToken,
    ) -> Result<C::Entity, CommandError> {
        let result = self.run_create(command, cancel).await;
        record_outcome(C::NAME, &result);
        result
    }

    /// Validates `command`, loads its target, applies the change, saves and announces it.
    pub async fn update<C: UpdateCommand>(
        &self,
        command: C,
        cancel: &CancellationToken,
    ) -> Result<C::Entity, CommandError> {
        let result = self.run_update(command, cancel).await;
        record_outcome(C::NAME, &result);
        result
    }

    /// Loads an entity owned by `tenant_id`.
    pub async fn load<E: Entity>(
        &self,
        tenant_id: &TenantId,
        id: AggregateId,
    ) -> Result<Option<E>, CommandError> {
        Ok(self.store.find_by_id::<E>(tenant_id, id).await?)
    }

    async fn run_create<C: CreateCommand>(
        &self,
        command: C,
        cancel: &CancellationToken,
    ) -> Result<C::Entity, CommandError> {
        command.validate()?;

        let entity = command.into_entity();
        let mut changes = ChangeSet::new();
        changes.add(&entity)?;

        self.persist_and_announce::<C>(changes, entity, cancel).await
    }

    async fn run_update<C: UpdateCommand>(
        &self,
        command: C,
        cancel: &CancellationToken,
    ) -> Result<C::Entity, CommandError> {
        command.validate()?;

        let tenant_id = command.tenant_id().clone();
        let id = command.aggregate_id();

        let loaded = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CommandError::Cancelled),
            loaded = self.load::<C::Entity>(&tenant_id, id) => loaded?,
        };
        let mut entity = loaded.ok_or(CommandError::NotFound {
            entity_type: <C::Entity as Entity>::ENTITY_TYPE,
            id,
        })?;

        command.apply(&mut entity)?;

        let mut changes = ChangeSet::new();
        changes.update(&entity)?;

        self.persist_and_announce::<C>(changes, entity, cancel).await
    }

    async fn persist_and_announce<C: Command>(
        &self,
        changes: ChangeSet,
        entity: C::Entity,
        cancel: &CancellationToken,
    ) -> Result<C::Entity, CommandError> {
        // Dropping an unfinished save rolls it back, so a cancelled command
        // leaves nothing behind. Past this point the token is not consulted.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CommandError::Cancelled),
            saved = self.store.save(changes) => saved?,
        }

        tracing::debug!(
            command = C::NAME,
            entity_type = <C::Entity as Entity>::ENTITY_TYPE,
            aggregate_id = %entity.id(),
            tenant_id = %entity.tenant_id(),
            "entity persisted"
        );

        let envelope =
            EventEnvelope::new(entity.tenant_id().clone(), entity.id(), C::event(&entity));
        self.publisher.publish_event(&envelope).await;

        Ok(entity)
    }
}

fn record_outcome<T>(command: &'static str, result: &Result<T, CommandError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(error) => error.outcome(),
    };
    metrics::counter!("commands_handled_total", "command" => command, "outcome" => outcome)
        .increment(1);
}
