//! Integration events announced for receipts.

use chrono::{DateTime, Utc};
use messaging::IntegrationEvent;
use serde::{Deserialize, Serialize};

use super::{Receipt, ReceiptFormat};

/// Topic shared by every receipt event.
pub const RECEIPTS_TOPIC: &str = "receipts-events";

/// A receipt file was uploaded and stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptUploaded {
    pub file_name: String,
    pub format: ReceiptFormat,
    pub storage_location: String,
}

impl IntegrationEvent for ReceiptUploaded {
    const TOPIC: &'static str = RECEIPTS_TOPIC;
    const EVENT_TYPE: &'static str = "receipt.uploaded";
}

impl From<&Receipt> for ReceiptUploaded {
    fn from(receipt: &Receipt) -> Self {
        Self {
            file_name: receipt.file_name().to_string(),
            format: receipt.format(),
            storage_location: receipt.storage_location().to_string(),
        }
    }
}

/// A receipt was checked against its document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptVerified {
    pub verified_at: DateTime<Utc>,
}

impl IntegrationEvent for ReceiptVerified {
    const TOPIC: &'static str = RECEIPTS_TOPIC;
    const EVENT_TYPE: &'static str = "receipt.verified";
}

/// A receipt was archived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptArchived {
    pub archived_at: DateTime<Utc>,
}

impl IntegrationEvent for ReceiptArchived {
    const TOPIC: &'static str = RECEIPTS_TOPIC;
    const EVENT_TYPE: &'static str = "receipt.archived";
}
