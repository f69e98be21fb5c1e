//! Domain error types.

use common::AggregateId;
use store::StoreError;
use thiserror::Error;

/// A command input or state transition that violates a business rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// The offending field, or `status` for rejected transitions.
    pub field: &'static str,

    /// Human-readable explanation.
    pub reason: String,
}

impl ValidationError {
    /// Creates a validation error for `field`.
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors returned by the command handler.
///
/// Broker failures never appear here. Publishing happens after the write
/// and its outcome is not reported to the caller.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command was rejected before anything was written.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The entity targeted by an update does not exist for the tenant.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: AggregateId,
    },

    /// The write failed; nothing was persisted and nothing was published.
    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),

    /// The caller cancelled before the write began.
    #[error("Command cancelled before persisting")]
    Cancelled,
}

impl CommandError {
    /// Short label used for the `outcome` metric label.
    pub fn outcome(&self) -> &'static str {
        match self {
            CommandError::Validation(_) => "invalid",
            CommandError::NotFound { .. } => "not_found",
            CommandError::Persistence(_) => "persistence_failed",
            CommandError::Cancelled => "cancelled",
        }
    }
}
