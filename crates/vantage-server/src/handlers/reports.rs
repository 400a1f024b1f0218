//! Client report handlers
//!
//! A report is composed fresh from the client's campaigns. Export renders the
//! dashboard capture into a paginated print package on disk and returns the
//! document metadata.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    Json,
};
use serde::Deserialize;

use crate::{get_user_email, AppError, AppState};
use vantage_core::prompts::client_insight_prompt;
use vantage_core::report::{compose_client_report, ClientReport, DataUrlSurface, ReportDocument};
use vantage_core::{metrics, PromptLibrary};

/// Query parameters for report composition
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// Generate an AI insight section (default false: placeholder text)
    #[serde(default)]
    pub insight: bool,
}

/// GET /api/clients/:id/report - Compose a client report
pub async fn get_client_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<ReportQuery>,
    request: Request,
) -> Result<Json<ClientReport>, AppError> {
    let user_email = get_user_email(request.headers());
    let viewer = state.resolve_viewer(request.headers());

    let client = state
        .db
        .get_client(&viewer, id)?
        .ok_or_else(|| AppError::not_found(&format!("Client {} not found", id)))?;
    let campaigns = state.db.list_campaigns_for_client(id)?;

    // Optionally generate the insight section; otherwise the report carries
    // placeholder text
    let insight = if params.insight {
        match &state.insight {
            Some(insight_client) => {
                let client_stats = metrics::client_metrics(&client, &campaigns);
                let mut prompt_lib = PromptLibrary::new();
                let prompt = client_insight_prompt(&mut prompt_lib, &client_stats)?;
                Some(insight_client.request_insight(&prompt).await)
            }
            None => None,
        }
    } else {
        None
    };

    let report = compose_client_report(&client, &campaigns, insight);

    state.db.log_audit(
        &user_email,
        "report",
        Some("client"),
        Some(id),
        Some(&format!(
            "campaigns={}, insight={}",
            campaigns.len(),
            params.insight
        )),
    )?;

    Ok(Json(report))
}

/// Request body for report export
#[derive(Debug, Deserialize)]
pub struct ExportReportRequest {
    /// Dashboard capture as a `data:image/png;base64,...` URL
    pub capture: String,
    /// Insight text to embed; absent uses the placeholder
    #[serde(default)]
    pub insight: Option<String>,
}

/// POST /api/clients/:id/report/export - Export a print package to disk
///
/// Returns 412 when the capture is missing or not a decodable PNG data URL.
pub async fn export_client_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<ReportDocument>, AppError> {
    let user_email = get_user_email(request.headers());
    let viewer = state.resolve_viewer(request.headers());

    let client = state
        .db
        .get_client(&viewer, id)?
        .ok_or_else(|| AppError::not_found(&format!("Client {} not found", id)))?;

    let bytes = axum::body::to_bytes(request.into_body(), crate::MAX_UPLOAD_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: ExportReportRequest =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let campaigns = state.db.list_campaigns_for_client(id)?;
    let report = compose_client_report(&client, &campaigns, req.insight);

    let surface = DataUrlSurface::new(req.capture);
    let document =
        vantage_core::report::export_client_report(&surface, &report, &state.reports_dir)?;

    state.db.log_audit(
        &user_email,
        "export",
        Some("report"),
        Some(id),
        Some(&format!(
            "file={}, pages={}, bytes={}",
            document.file_name, document.pages, document.size
        )),
    )?;

    Ok(Json(document))
}
