//! HTTP route handlers.

pub mod audit_reports;
pub mod health;
pub mod metrics;
pub mod receipts;

use std::sync::Arc;

use common::AggregateId;
use domain::{AuditReportService, ReceiptService};
use store::EntityStore;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EntityStore> {
    pub receipts: ReceiptService<S>,
    pub audit_reports: AuditReportService<S>,

    /// Cancelled when the server starts shutting down. Each request works
    /// with a child token.
    pub shutdown: CancellationToken,
}

pub(crate) type SharedState<S> = Arc<AppState<S>>;

pub(crate) fn parse_aggregate_id(id: &str) -> Result<AggregateId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid id {id}: {e}")))
}
