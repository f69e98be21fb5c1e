//! Time audit reports.

mod aggregate;
mod commands;
mod events;
mod service;

pub use aggregate::AuditReport;
pub use commands::GenerateAuditReport;
pub use events::{AuditReportGenerated, TIMEAUDIT_TOPIC};
pub use service::{AuditReportDto, AuditReportService};
