//! Receipt commands.

use chrono::NaiveDate;
use common::{AggregateId, TenantId};

use crate::command::{Command, CreateCommand, UpdateCommand};
use crate::error::ValidationError;
use crate::validation::{optional_text, require_tenant, require_text};

use super::aggregate::ReceiptDetails;
use super::{Receipt, ReceiptArchived, ReceiptUploaded, ReceiptVerified};

const MAX_FILE_NAME_LEN: usize = 255;
const MAX_RECEIPT_NUMBER_LEN: usize = 64;
const MAX_STORE_NAME_LEN: usize = 200;

/// Command to record a newly uploaded receipt file.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    /// The tenant uploading the receipt.
    pub tenant_id: TenantId,

    /// The receipt ID to create.
    pub receipt_id: AggregateId,

    /// Original file name, including extension.
    pub file_name: String,

    pub receipt_number: Option<String>,
    pub store_name: Option<String>,
    pub total_amount_cents: Option<i64>,
    pub receipt_date: Option<NaiveDate>,
}

impl UploadReceipt {
    /// Creates an upload command with a generated receipt ID.
    pub fn new(tenant_id: impl Into<TenantId>, file_name: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            receipt_id: AggregateId::new(),
            file_name: file_name.into(),
            receipt_number: None,
            store_name: None,
            total_amount_cents: None,
            receipt_date: None,
        }
    }

    /// Sets the store the purchase was made at.
    pub fn with_store(mut self, store_name: impl Into<String>) -> Self {
        self.store_name = Some(store_name.into());
        self
    }

    /// Sets the printed receipt number.
    pub fn with_receipt_number(mut self, receipt_number: impl Into<String>) -> Self {
        self.receipt_number = Some(receipt_number.into());
        self
    }

    /// Sets the amount paid, in minor currency units.
    pub fn with_total_cents(mut self, cents: i64) -> Self {
        self.total_amount_cents = Some(cents);
        self
    }

    /// Sets the purchase date.
    pub fn with_receipt_date(mut self, date: NaiveDate) -> Self {
        self.receipt_date = Some(date);
        self
    }
}

impl Command for UploadReceipt {
    type Entity = Receipt;
    type Event = ReceiptUploaded;

    const NAME: &'static str = "upload_receipt";

    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_tenant(&self.tenant_id)?;
        require_text("file_name", &self.file_name, MAX_FILE_NAME_LEN)?;
        if self.file_name.contains(['/', '\\']) {
            return Err(ValidationError::new(
                "file_name",
                "must not contain path separators",
            ));
        }
        optional_text(
            "receipt_number",
            self.receipt_number.as_deref(),
            MAX_RECEIPT_NUMBER_LEN,
        )?;
        optional_text("store_name", self.store_name.as_deref(), MAX_STORE_NAME_LEN)?;
        if let Some(cents) = self.total_amount_cents
            && cents < 0
        {
            return Err(ValidationError::new(
                "total_amount_cents",
                format!("must not be negative, got {cents}"),
            ));
        }
        Ok(())
    }

    fn event(entity: &Receipt) -> ReceiptUploaded {
        ReceiptUploaded::from(entity)
    }
}

impl CreateCommand for UploadReceipt {
    fn into_entity(self) -> Receipt {
        Receipt::upload(
            self.receipt_id,
            self.tenant_id,
            self.file_name,
            ReceiptDetails {
                receipt_number: self.receipt_number,
                store_name: self.store_name,
                total_amount_cents: self.total_amount_cents,
                receipt_date: self.receipt_date,
            },
        )
    }
}

/// Command to mark a receipt as verified.
#[derive(Debug, Clone)]
pub struct VerifyReceipt {
    pub tenant_id: TenantId,
    pub receipt_id: AggregateId,
}

impl VerifyReceipt {
    /// Creates a new VerifyReceipt command.
    pub fn new(tenant_id: impl Into<TenantId>, receipt_id: AggregateId) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            receipt_id,
        }
    }
}

impl Command for VerifyReceipt {
    type Entity = Receipt;
    type Event = ReceiptVerified;

    const NAME: &'static str = "verify_receipt";

    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_tenant(&self.tenant_id)
    }

    fn event(entity: &Receipt) -> ReceiptVerified {
        ReceiptVerified {
            verified_at: entity.updated_at(),
        }
    }
}

impl UpdateCommand for VerifyReceipt {
    fn aggregate_id(&self) -> AggregateId {
        self.receipt_id
    }

    fn apply(self, entity: &mut Receipt) -> Result<(), ValidationError> {
        entity.verify()
    }
}

/// Command to archive a receipt.
#[derive(Debug, Clone)]
pub struct ArchiveReceipt {
    pub tenant_id: TenantId,
    pub receipt_id: AggregateId,
}

impl ArchiveReceipt {
    /// Creates a new ArchiveReceipt command.
    pub fn new(tenant_id: impl Into<TenantId>, receipt_id: AggregateId) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            receipt_id,
        }
    }
}

impl Command for ArchiveReceipt {
    type Entity = Receipt;
    type Event = ReceiptArchived;

    const NAME: &'static str = "archive_receipt";

    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_tenant(&self.tenant_id)
    }

    fn event(entity: &Receipt) -> ReceiptArchived {
        ReceiptArchived {
            archived_at: entity.updated_at(),
        }
    }
}

impl UpdateCommand for ArchiveReceipt {
    fn aggregate_id(&self) -> AggregateId {
        self.receipt_id
    }

    fn apply(self, entity: &mut Receipt) -> Result<(), ValidationError> {
        entity.archive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_upload_passes() {
        let cmd = UploadReceipt::new("T1", "x.pdf")
            .with_store("Hardware Hut")
            .with_total_cents(1999);
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn empty_file_name_is_rejected() {
        let error = UploadReceipt::new("T1", "").validate().unwrap_err();
        assert_eq!(error.field, "file_name");
    }

    #[test]
    fn overlong_file_name_is_rejected() {
        let name = format!("{}.pdf", "a".repeat(252));
        assert_eq!(name.len(), 256);
        let error = UploadReceipt::new("T1", name).validate().unwrap_err();
        assert_eq!(error.field, "file_name");
    }

    #[test]
    fn path_in_file_name_is_rejected() {
        let error = UploadReceipt::new("T1", "../etc/passwd").validate().unwrap_err();
        assert_eq!(error.field, "file_name");
    }

    #[test]
    fn negative_total_is_rejected() {
        let error = UploadReceipt::new("T1", "x.pdf")
            .with_total_cents(-1)
            .validate()
            .unwrap_err();
        assert_eq!(error.field, "total_amount_cents");
    }

    #[test]
    fn blank_tenant_is_rejected() {
        let error = VerifyReceipt::new(" ", AggregateId::new())
            .validate()
            .unwrap_err();
        assert_eq!(error.field, "tenant_id");
    }

    #[test]
    fn uploaded_event_carries_file_name() {
        let receipt = UploadReceipt::new("T1", "x.pdf").into_entity();
        let event = UploadReceipt::event(&receipt);
        assert_eq!(event.file_name, "x.pdf");
        assert_eq!(event.storage_location, receipt.storage_location());
    }
}
