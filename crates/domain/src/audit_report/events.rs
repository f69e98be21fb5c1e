//! Integration events announced for audit reports.

use chrono::NaiveDate;
use messaging::IntegrationEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuditReport;

/// Topic of the time-audit service.
pub const TIMEAUDIT_TOPIC: &str = "timeaudit-events";

/// A time audit report was generated for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReportGenerated {
    pub user_id: Uuid,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub productivity_percentage: f64,
}

impl IntegrationEvent for AuditReportGenerated {
    const TOPIC: &'static str = TIMEAUDIT_TOPIC;
    const EVENT_TYPE: &'static str = "auditreport.generated";
}

impl From<&AuditReport> for AuditReportGenerated {
    fn from(report: &AuditReport) -> Self {
        Self {
            user_id: report.user_id(),
            title: report.title().to_string(),
            start_date: report.start_date(),
            end_date: report.end_date(),
            productivity_percentage: report.productivity_percentage(),
        }
    }
}
