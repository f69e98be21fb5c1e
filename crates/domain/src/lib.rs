//! Business entities and the command pipeline that persists them and then
//! announces the change.
//!
//! This crate provides:
//! - [`CommandHandler`], the validate, persist, publish pipeline shared by every entity
//! - Receipts ([`ReceiptService`]) announcing on `receipts-events`
//! - Time audit reports ([`AuditReportService`]) announcing on `timeaudit-events`

pub mod audit_report;
pub mod command;
pub mod error;
pub mod receipt;
mod validation;

pub use audit_report::{
    AuditReport, AuditReportDto, AuditReportGenerated, AuditReportService, GenerateAuditReport,
    TIMEAUDIT_TOPIC,
};
pub use command::{Command, CommandHandler, CreateCommand, UpdateCommand};
pub use error::{CommandError, ValidationError};
pub use receipt::{
    ArchiveReceipt, RECEIPTS_TOPIC, Receipt, ReceiptArchived, ReceiptDto, ReceiptFormat,
    ReceiptService, ReceiptStatus, ReceiptUploaded, ReceiptVerified, UploadReceipt, VerifyReceipt,
};
