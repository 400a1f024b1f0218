//! Audit log handlers (admin only)

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{require_admin, AppError, AppState, MAX_PAGE_LIMIT};
use vantage_core::models::AuditEntry;

/// Query parameters for the audit log
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    /// Number of entries to return (newest first)
    #[serde(default = "default_audit_limit")]
    pub limit: i64,
}

fn default_audit_limit() -> i64 {
    100
}

/// Response for the audit log endpoint
#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub entries: Vec<AuditEntry>,
    /// Total entries in the log, not just this page
    pub total: i64,
}

/// GET /api/audit - Read the audit log, newest first (admin only)
pub async fn list_audit_log(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditQuery>,
    request: Request,
) -> Result<Json<AuditLogResponse>, AppError> {
    require_admin(&state, request.headers())?;

    // Clamp limit to valid range
    let limit = params.limit.max(1).min(MAX_PAGE_LIMIT);

    let entries = state.db.list_audit_log(limit)?;
    let total = state.db.count_audit_log()?;

    Ok(Json(AuditLogResponse { entries, total }))
}
