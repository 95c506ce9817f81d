/// Audit log listing endpoint
///
/// Read-only, staff-only view over the audit trail: 25 records per page,
/// strictly newest-first. There is no corresponding write surface anywhere
/// in the API; records are appended only by the recorder.
///
/// # Endpoint
///
/// ```text
/// GET /v1/audit-logs?page=N
/// ```

use crate::{
    app::{AppState, CurrentUser},
    error::ApiResult,
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use securetask_shared::models::audit_log::{AuditLog, PAGE_SIZE};
use serde::{Deserialize, Serialize};

/// Pagination query
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// 1-based page number (default 1)
    pub page: Option<i64>,
}

/// One page of audit records
#[derive(Debug, Serialize)]
pub struct AuditLogPage {
    /// Records, newest-first
    pub logs: Vec<AuditLog>,

    /// Current page (1-based)
    pub page: i64,

    /// Records per page
    pub per_page: i64,

    /// Total record count
    pub total: i64,

    /// Total page count
    pub total_pages: i64,
}

/// Computes the page count for a total
pub(crate) fn page_count(total: i64, per_page: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (total + per_page - 1) / per_page
    }
}

/// Lists audit records, staff only
///
/// # Errors
///
/// - `401 Unauthorized`: No valid session (rejected by the auth layer)
/// - `403 Forbidden`: Caller is not staff
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<AuditLogPage>> {
    current.require_staff()?;

    let page = query.page.unwrap_or(1).max(1);
    let logs = AuditLog::list(&state.db, page).await?;
    let total = AuditLog::count(&state.db).await?;

    Ok(Json(AuditLogPage {
        logs,
        page,
        per_page: PAGE_SIZE,
        total,
        total_pages: page_count(total, PAGE_SIZE),
    }))
}
