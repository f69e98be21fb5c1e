//! Audit report service.

use chrono::{DateTime, NaiveDate, Utc};
use common::{AggregateId, TenantId};
use messaging::EventPublisher;
use serde::Serialize;
use store::{Entity, EntityStore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::command::CommandHandler;
use crate::error::CommandError;

use super::{AuditReport, GenerateAuditReport};

/// Audit report as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReportDto {
    pub id: AggregateId,
    pub tenant_id: TenantId,
    pub user_id: Uuid,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_tracked_hours: f64,
    pub productive_hours: f64,
    pub productivity_percentage: f64,
    pub summary: Option<String>,
    pub insights: Option<String>,
    pub recommendations: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl From<&AuditReport> for AuditReportDto {
    fn from(report: &AuditReport) -> Self {
        Self {
            id: report.id(),
            tenant_id: report.tenant_id().clone(),
            user_id: report.user_id(),
            title: report.title().to_string(),
            start_date: report.start_date(),
            end_date: report.end_date(),
            total_tracked_hours: report.total_tracked_hours(),
            productive_hours: report.productive_hours(),
            productivity_percentage: report.productivity_percentage(),
            summary: report.summary().map(str::to_string),
            insights: report.insights().map(str::to_string),
            recommendations: report.recommendations().map(str::to_string),
            generated_at: report.generated_at(),
        }
    }
}

/// Service for generating and reading time audit reports.
pub struct AuditReportService<S: EntityStore> {
    handler: CommandHandler<S>,
}

impl<S: EntityStore> AuditReportService<S> {
    /// Creates an audit report service.
    pub fn new(store: S, publisher: EventPublisher) -> Self {
        Self {
            handler: CommandHandler::new(store, publisher),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S> {
        &self.handler
    }

    /// Stores a report and announces `auditreport.generated`.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn generate_report(
        &self,
        cmd: GenerateAuditReport,
        cancel: &CancellationToken,
    ) -> Result<AuditReportDto, CommandError> {
        let report = self.handler.create(cmd, cancel).await?;
        Ok(AuditReportDto::from(&report))
    }

    /// Loads a report owned by `tenant_id`.
    #[tracing::instrument(skip(self))]
    pub async fn get_report(
        &self,
        tenant_id: &TenantId,
        report_id: AggregateId,
    ) -> Result<Option<AuditReportDto>, CommandError> {
        let report = self.handler.load::<AuditReport>(tenant_id, report_id).await?;
        Ok(report.as_ref().map(AuditReportDto::from))
    }
}
