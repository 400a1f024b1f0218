//! Data export handlers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{header, StatusCode},
    response::Response,
};
use serde::Deserialize;
use tracing::info;

use crate::{get_user_email, AppError, AppState};
use vantage_core::models::CampaignStatus;
use vantage_core::CampaignExportOptions;

/// Query parameters for campaign export
#[derive(Debug, Deserialize)]
pub struct CampaignExportQuery {
    /// Restrict to one client's campaigns
    pub client_id: Option<i64>,
    /// Restrict to one status (ongoing, completed)
    pub status: Option<String>,
}

/// GET /api/export/campaigns.csv - Download campaigns as CSV
pub async fn export_campaigns_csv(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CampaignExportQuery>,
    request: Request,
) -> Result<Response, AppError> {
    let user_email = get_user_email(request.headers());

    let status = match params.status.as_deref() {
        Some(value) => Some(
            value
                .parse::<CampaignStatus>()
                .map_err(|e| AppError::bad_request(&e))?,
        ),
        None => None,
    };

    let opts = CampaignExportOptions {
        client_id: params.client_id,
        status,
    };

    let csv = state.db.export_campaigns_csv(&opts)?;
    let lines = csv.lines().count().saturating_sub(1);

    info!("Exported {} campaigns to CSV", lines);

    // Audit log
    state.db.log_audit(
        &user_email,
        "export",
        Some("campaign"),
        None,
        Some(&format!(
            "format=csv, rows={}, client_id={:?}, status={:?}",
            lines, params.client_id, params.status
        )),
    )?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"campaigns.csv\"",
        )
        .body(Body::from(csv))
        .map_err(|e| AppError::internal(&e.to_string()))
}

/// GET /api/export/clients.csv - Download the client roster as CSV
///
/// Scoped to the viewer: owners only download their own clients.
pub async fn export_clients_csv(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, AppError> {
    let user_email = get_user_email(request.headers());
    let viewer = state.resolve_viewer(request.headers());

    let csv = state.db.export_clients_csv(&viewer)?;
    let lines = csv.lines().count().saturating_sub(1);

    info!("Exported {} clients to CSV", lines);

    // Audit log
    state.db.log_audit(
        &user_email,
        "export",
        Some("client"),
        None,
        Some(&format!("format=csv, rows={}", lines)),
    )?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"clients.csv\"",
        )
        .body(Body::from(csv))
        .map_err(|e| AppError::internal(&e.to_string()))
}
