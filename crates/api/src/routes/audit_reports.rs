//! Time audit report endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use common::TenantId;
use domain::{AuditReportDto, GenerateAuditReport};
use serde::Deserialize;
use store::EntityStore;
use uuid::Uuid;

use super::{SharedState, parse_aggregate_id};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct GenerateReportRequest {
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

/// POST /tenants/{tenant_id}/audit-reports: store a generated report.
#[tracing::instrument(skip(state, req))]
pub async fn generate<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Path(tenant_id): Path<String>,
    Json(req): Json<GenerateReportRequest>,
) -> Result<(StatusCode, Json<AuditReportDto>), ApiError> {
    let cmd = GenerateAuditReport::new(
        tenant_id,
        req.user_id,
        req.title,
        req.start_date,
        req.end_date,
    )
    .with_hours(req.total_tracked_hours, req.productive_hours)
    .with_narrative(req.summary, req.insights, req.recommendations);

    let cancel = state.shutdown.child_token();
    let report = state.audit_reports.generate_report(cmd, &cancel).await?;

    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /tenants/{tenant_id}/audit-reports/{id}: load a report.
#[tracing::instrument(skip(state))]
pub async fn get<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Path((tenant_id, id)): Path<(String, String)>,
) -> Result<Json<AuditReportDto>, ApiError> {
    let report_id = parse_aggregate_id(&id)?;
    let report = state
        .audit_reports
        .get_report(&TenantId::new(tenant_id), report_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Audit report {id} not found")))?;

    Ok(Json(report))
}
