//! Receipt entity.

use chrono::{DateTime, NaiveDate, Utc};
use common::{AggregateId, TenantId};
use serde::{Deserialize, Serialize};
use store::Entity;

use crate::error::ValidationError;

use super::{ReceiptFormat, ReceiptStatus};

/// An uploaded proof of purchase, kept for warranty and return claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    id: AggregateId,
    tenant_id: TenantId,
    file_name: String,
    format: ReceiptFormat,

    /// Where the uploaded file lives in blob storage.
    storage_location: String,

    receipt_number: Option<String>,
    store_name: Option<String>,

    /// Total paid, in minor currency units.
    total_amount_cents: Option<i64>,

    /// Purchase date printed on the receipt.
    receipt_date: Option<NaiveDate>,

    status: ReceiptStatus,
    is_verified: bool,
    uploaded_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Receipt details captured at upload time.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReceiptDetails {
    pub receipt_number: Option<String>,
    pub store_name: Option<String>,
    pub total_amount_cents: Option<i64>,
    pub receipt_date: Option<NaiveDate>,
}

impl Receipt {
    pub(crate) fn upload(
        id: AggregateId,
        tenant_id: TenantId,
        file_name: String,
        details: ReceiptDetails,
    ) -> Self {
        let now = Utc::now();
        Self {
            format: ReceiptFormat::from_file_name(&file_name),
            storage_location: format!("tenants/{tenant_id}/receipts/{id}/{file_name}"),
            id,
            tenant_id,
            file_name,
            receipt_number: details.receipt_number,
            store_name: details.store_name,
            total_amount_cents: details.total_amount_cents,
            receipt_date: details.receipt_date,
            status: ReceiptStatus::Active,
            is_verified: false,
            uploaded_at: now,
            updated_at: now,
        }
    }

    /// Marks the receipt as checked against the uploaded document.
    pub fn verify(&mut self) -> Result<(), ValidationError> {
        if !self.status.is_active() {
            return Err(ValidationError::new(
                "status",
                "cannot verify an archived receipt",
            ));
        }
        if self.is_verified {
            return Err(ValidationError::new("status", "receipt is already verified"));
        }
        self.is_verified = true;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Moves the receipt out of the active set.
    pub fn archive(&mut self) -> Result<(), ValidationError> {
        if !self.status.is_active() {
            return Err(ValidationError::new("status", "receipt is already archived"));
        }
        self.status = ReceiptStatus::Archived;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> ReceiptFormat {
        self.format
    }

    pub fn storage_location(&self) -> &str {
        &self.storage_location
    }

    pub fn receipt_number(&self) -> Option<&str> {
        self.receipt_number.as_deref()
    }

    pub fn store_name(&self) -> Option<&str> {
        self.store_name.as_deref()
    }

    pub fn total_amount_cents(&self) -> Option<i64> {
        self.total_amount_cents
    }

    pub fn receipt_date(&self) -> Option<NaiveDate> {
        self.receipt_date
    }

    pub fn status(&self) -> ReceiptStatus {
        self.status
    }

    pub fn is_verified(&self) -> bool {
        self.is_verified
    }

    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Entity for Receipt {
    const ENTITY_TYPE: &'static str = "receipt";

    fn id(&self) -> AggregateId {
        self.id
    }

    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}
