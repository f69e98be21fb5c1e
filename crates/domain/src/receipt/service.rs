//! Receipt service providing the API-facing operations.

use chrono::{DateTime, NaiveDate, Utc};
use common::{AggregateId, TenantId};
use messaging::EventPublisher;
use serde::Serialize;
use store::{Entity, EntityStore};
use tokio_util::sync::CancellationToken;

use crate::command::CommandHandler;
use crate::error::CommandError;

use super::{ArchiveReceipt, Receipt, ReceiptFormat, ReceiptStatus, UploadReceipt, VerifyReceipt};

/// Receipt as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptDto {
    pub id: AggregateId,
    pub tenant_id: TenantId,
    pub file_name: String,
    pub format: ReceiptFormat,
    pub storage_location: String,
    pub receipt_number: Option<String>,
    pub store_name: Option<String>,
    pub total_amount_cents: Option<i64>,
    pub receipt_date: Option<NaiveDate>,
    pub status: ReceiptStatus,
    pub is_verified: bool,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Receipt> for ReceiptDto {
    fn from(receipt: &Receipt) -> Self {
        Self {
            id: receipt.id(),
            tenant_id: receipt.tenant_id().clone(),
            file_name: receipt.file_name().to_string(),
            format: receipt.format(),
            storage_location: receipt.storage_location().to_string(),
            receipt_number: receipt.receipt_number().map(str::to_string),
            store_name: receipt.store_name().map(str::to_string),
            total_amount_cents: receipt.total_amount_cents(),
            receipt_date: receipt.receipt_date(),
            status: receipt.status(),
            is_verified: receipt.is_verified(),
            uploaded_at: receipt.uploaded_at(),
            updated_at: receipt.updated_at(),
        }
    }
}

/// Service for managing receipts.
///
/// Every mutation persists first and then announces a `receipt.*` event on
/// the `receipts-events` topic.
pub struct ReceiptService<S: EntityStore> {
    handler: CommandHandler<S>,
}

impl<S: EntityStore> ReceiptService<S> {
    /// Creates a receipt service writing to `store` and announcing through `publisher`.
    pub fn new(store: S, publisher: EventPublisher) -> Self {
        Self {
            handler: CommandHandler::new(store, publisher),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S> {
        &self.handler
    }

    /// Records an uploaded receipt and announces `receipt.uploaded`.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn upload_receipt(
        &self,
        cmd: UploadReceipt,
        cancel: &CancellationToken,
    ) -> Result<ReceiptDto, CommandError> {
        let receipt = self.handler.create(cmd, cancel).await?;
        Ok(ReceiptDto::from(&receipt))
    }

    /// Verifies a receipt and announces `receipt.verified`.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn verify_receipt(
        &self,
        cmd: VerifyReceipt,
        cancel: &CancellationToken,
    ) -> Result<ReceiptDto, CommandError> {
        let receipt = self.handler.update(cmd, cancel).await?;
        Ok(ReceiptDto::from(&receipt))
    }

    /// Archives a receipt and announces `receipt.archived`.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn archive_receipt(
        &self,
        cmd: ArchiveReceipt,
        cancel: &CancellationToken,
    ) -> Result<ReceiptDto, CommandError> {
        let receipt = self.handler.update(cmd, cancel).await?;
        Ok(ReceiptDto::from(&receipt))
    }

    /// Loads a receipt owned by `tenant_id`.
    ///
    /// Returns None if it doesn't exist or belongs to another tenant.
    #[tracing::instrument(skip(self))]
    pub async fn get_receipt(
        &self,
        tenant_id: &TenantId,
        receipt_id: AggregateId,
    ) -> Result<Option<ReceiptDto>, CommandError> {
        let receipt = self.handler.load::<Receipt>(tenant_id, receipt_id).await?;
        Ok(receipt.as_ref().map(ReceiptDto::from))
    }
}
