//! Audit report entity.

use chrono::{DateTime, NaiveDate, Utc};
use common::{AggregateId, TenantId};
use serde::{Deserialize, Serialize};
use store::Entity;
use uuid::Uuid;

/// A generated summary of how a user's tracked time was spent over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    id: AggregateId,
    tenant_id: TenantId,

    /// The user whose time was audited.
    user_id: Uuid,

    title: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    total_tracked_hours: f64,
    productive_hours: f64,
    summary: Option<String>,
    insights: Option<String>,
    recommendations: Option<String>,
    generated_at: DateTime<Utc>,
}

/// Inputs for a new report. Validated by the generating command.
#[derive(Debug, Clone)]
pub(crate) struct ReportContents {
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

impl AuditReport {
    pub(crate) fn generate(id: AggregateId, tenant_id: TenantId, contents: ReportContents) -> Self {
        Self {
            id,
            tenant_id,
            user_id: contents.user_id,
            title: contents.title,
            start_date: contents.start_date,
            end_date: contents.end_date,
            total_tracked_hours: contents.total_tracked_hours,
            productive_hours: contents.productive_hours,
            summary: contents.summary,
            insights: contents.insights,
            recommendations: contents.recommendations,
            generated_at: Utc::now(),
        }
    }

    /// Share of tracked time that was productive, from 0 to 100.
    ///
    /// Zero when nothing was tracked.
    pub fn productivity_percentage(&self) -> f64 {
        if self.total_tracked_hours <= 0.0 {
            return 0.0;
        }
        self.productive_hours / self.total_tracked_hours * 100.0
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn total_tracked_hours(&self) -> f64 {
        self.total_tracked_hours
    }

    pub fn productive_hours(&self) -> f64 {
        self.productive_hours
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn insights(&self) -> Option<&str> {
        self.insights.as_deref()
    }

    pub fn recommendations(&self) -> Option<&str> {
        self.recommendations.as_deref()
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }
}

impl Entity for AuditReport {
    const ENTITY_TYPE: &'static str = "audit_report";

    fn id(&self) -> AggregateId {
        self.id
    }

    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(total: f64, productive: f64) -> AuditReport {
        AuditReport::generate(
            AggregateId::new(),
            TenantId::new("T2"),
            ReportContents {
                user_id: Uuid::new_v4(),
                title: "Week 41".to_string(),
                start_date: NaiveDate::from_ymd_opt(2026, 10, 5).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 10, 11).unwrap(),
                total_tracked_hours: total,
                productive_hours: productive,
                summary: None,
                insights: None,
                recommendations: None,
            },
        )
    }

    #[test]
    fn productivity_is_a_percentage_of_tracked_time() {
        assert_eq!(report(40.0, 30.0).productivity_percentage(), 75.0);
        assert_eq!(report(8.0, 8.0).productivity_percentage(), 100.0);
    }

    #[test]
    fn productivity_is_zero_without_tracked_time() {
        assert_eq!(report(0.0, 0.0).productivity_percentage(), 0.0);
    }
}
