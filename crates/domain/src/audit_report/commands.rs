//! Audit report commands.

use chrono::NaiveDate;
use common::{AggregateId, TenantId};
use uuid::Uuid;

use crate::command::{Command, CreateCommand};
use crate::error::ValidationError;
use crate::validation::{optional_text, require_tenant, require_text};

use super::aggregate::ReportContents;
use super::{AuditReport, AuditReportGenerated};

const MAX_TITLE_LEN: usize = 200;
const MAX_NARRATIVE_LEN: usize = 4000;

/// Command to store a generated time audit report.
#[derive(Debug, Clone)]
pub struct GenerateAuditReport {
    pub tenant_id: TenantId,

    /// The report ID to create.
    pub report_id: AggregateId,

    pub user_id: Uuid,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_tracked_hours: f64,
    pub productive_hours: f64,
    pub summary: Option<String>,
    pub insights: Option<String>,
    pub recommendations: Option<String>,
}

impl GenerateAuditReport {
    /// Creates a report command with a generated report ID and no narrative.
    pub fn new(
        tenant_id: impl Into<TenantId>,
        user_id: Uuid,
        title: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            report_id: AggregateId::new(),
            user_id,
            title: title.into(),
            start_date,
            end_date,
            total_tracked_hours: 0.0,
            productive_hours: 0.0,
            summary: None,
            insights: None,
            recommendations: None,
        }
    }

    /// Sets the tracked and productive hours for the period.
    pub fn with_hours(mut self, total_tracked_hours: f64, productive_hours: f64) -> Self {
        self.total_tracked_hours = total_tracked_hours;
        self.productive_hours = productive_hours;
        self
    }

    /// Sets the narrative sections of the report.
    pub fn with_narrative(
        mut self,
        summary: Option<String>,
        insights: Option<String>,
        recommendations: Option<String>,
    ) -> Self {
        self.summary = summary;
        self.insights = insights;
        self.recommendations = recommendations;
        self
    }
}

fn check_hours(field: &'static str, hours: f64) -> Result<(), ValidationError> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(ValidationError::new(
            field,
            format!("must be a non-negative number, got {hours}"),
        ));
    }
    Ok(())
}

impl Command for GenerateAuditReport {
    type Entity = AuditReport;
    type Event = AuditReportGenerated;

    const NAME: &'static str = "generate_audit_report";

    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_tenant(&self.tenant_id)?;
        if self.user_id.is_nil() {
            return Err(ValidationError::new("user_id", "must not be nil"));
        }
        require_text("title", &self.title, MAX_TITLE_LEN)?;
        if self.end_date < self.start_date {
            return Err(ValidationError::new(
                "end_date",
                format!(
                    "must not be before start_date ({} < {})",
                    self.end_date, self.start_date
                ),
            ));
        }
        check_hours("total_tracked_hours", self.total_tracked_hours)?;
        check_hours("productive_hours", self.productive_hours)?;
        if self.productive_hours > self.total_tracked_hours {
            return Err(ValidationError::new(
                "productive_hours",
                "must not exceed total_tracked_hours",
            ));
        }
        optional_text("summary", self.summary.as_deref(), MAX_NARRATIVE_LEN)?;
        optional_text("insights", self.insights.as_deref(), MAX_NARRATIVE_LEN)?;
        optional_text(
            "recommendations",
            self.recommendations.as_deref(),
            MAX_NARRATIVE_LEN,
        )?;
        Ok(())
    }

    fn event(entity: &AuditReport) -> AuditReportGenerated {
        AuditReportGenerated::from(entity)
    }
}

impl CreateCommand for GenerateAuditReport {
    fn into_entity(self) -> AuditReport {
        AuditReport::generate(
            self.report_id,
            self.tenant_id,
            ReportContents {
                user_id: self.user_id,
                title: self.title,
                start_date: self.start_date,
                end_date: self.end_date,
                total_tracked_hours: self.total_tracked_hours,
                productive_hours: self.productive_hours,
                summary: self.summary,
                insights: self.insights,
                recommendations: self.recommendations,
            },
        )
    }
}
