//! Receipts: uploaded proofs of purchase.

mod aggregate;
mod commands;
mod events;
mod service;
mod value_objects;

pub use aggregate::Receipt;
pub use commands::{ArchiveReceipt, UploadReceipt, VerifyReceipt};
pub use events::{RECEIPTS_TOPIC, ReceiptArchived, ReceiptUploaded, ReceiptVerified};
pub use service::{ReceiptDto, ReceiptService};
pub use value_objects::{ReceiptFormat, ReceiptStatus};
