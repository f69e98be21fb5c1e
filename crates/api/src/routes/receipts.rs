//! Receipt endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use common::TenantId;
use domain::{ArchiveReceipt, ReceiptDto, UploadReceipt, VerifyReceipt};
use serde::Deserialize;
use store::EntityStore;

use super::{SharedState, parse_aggregate_id};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct UploadReceiptRequest {
    pub file_name: String,
    pub receipt_number: Option<String>,
    pub store_name: Option<String>,
    pub total_amount_cents: Option<i64>,
    pub receipt_date: Option<NaiveDate>,
}

/// POST /tenants/{tenant_id}/receipts: record an uploaded receipt.
#[tracing::instrument(skip(state, req))]
pub async fn upload<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Path(tenant_id): Path<String>,
    Json(req): Json<UploadReceiptRequest>,
) -> Result<(StatusCode, Json<ReceiptDto>), ApiError> {
    let mut cmd = UploadReceipt::new(tenant_id, req.file_name);
    cmd.receipt_number = req.receipt_number;
    cmd.store_name = req.store_name;
    cmd.total_amount_cents = req.total_amount_cents;
    cmd.receipt_date = req.receipt_date;

    let cancel = state.shutdown.child_token();
    let receipt = state.receipts.upload_receipt(cmd, &cancel).await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /tenants/{tenant_id}/receipts/{id}: load a receipt.
#[tracing::instrument(skip(state))]
pub async fn get<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Path((tenant_id, id)): Path<(String, String)>,
) -> Result<Json<ReceiptDto>, ApiError> {
    let receipt_id = parse_aggregate_id(&id)?;
    let receipt = state
        .receipts
        .get_receipt(&TenantId::new(tenant_id), receipt_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Receipt {id} not found")))?;

    Ok(Json(receipt))
}

/// POST /tenants/{tenant_id}/receipts/{id}/verify: mark a receipt as verified.
#[tracing::instrument(skip(state))]
pub async fn verify<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Path((tenant_id, id)): Path<(String, String)>,
) -> Result<Json<ReceiptDto>, ApiError> {
    let receipt_id = parse_aggregate_id(&id)?;
    let cancel = state.shutdown.child_token();
    let receipt = state
        .receipts
        .verify_receipt(VerifyReceipt::new(tenant_id, receipt_id), &cancel)
        .await?;

    Ok(Json(receipt))
}

/// POST /tenants/{tenant_id}/receipts/{id}/archive: archive a receipt.
#[tracing::instrument(skip(state))]
pub async fn archive<S: EntityStore + 'static>(
    State(state): State<SharedState<S>>,
    Path((tenant_id, id)): Path<(String, String)>,
) -> Result<Json<ReceiptDto>, ApiError> {
    let receipt_id = parse_aggregate_id(&id)?;
    let cancel = state.shutdown.child_token();
    let receipt = state
        .receipts
        .archive_receipt(ArchiveReceipt::new(tenant_id, receipt_id), &cancel)
        .await?;

    Ok(Json(receipt))
}
