use thiserror::Error;

use crate::AggregateId;

/// Errors that can occur when interacting with an entity store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An entity with the same type and ID already exists.
    #[error("Duplicate {entity_type} id: {id}")]
    DuplicateId { entity_type: String, id: AggregateId },

    /// The entity to update does not exist for the given tenant.
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: AggregateId },

    /// The change set cannot be saved as submitted.
    #[error("Invalid change set: {0}")]
    InvalidChangeSet(String),

    /// The store cannot be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
