//! Field checks shared by command validators.

use common::TenantId;

use crate::error::ValidationError;

pub(crate) fn require_tenant(tenant_id: &TenantId) -> Result<(), ValidationError> {
    if tenant_id.is_blank() {
        return Err(ValidationError::new("tenant_id", "must not be blank"));
    }
    Ok(())
}

pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be blank"));
    }
    check_length(field, value, max_len)
}

pub(crate) fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max_len: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(value) => check_length(field, value, max_len),
        None => Ok(()),
    }
}

fn check_length(field: &'static str, value: &str, max_len: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max_len} characters, got {len}"),
        ));
    }
    Ok(())
}
