//! Dashboard metrics handler

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    Json,
};

use crate::{get_user_email, AppError, AppState};
use vantage_core::metrics;
use vantage_core::models::DashboardMetrics;

/// GET /api/dashboard - Full dashboard snapshot
///
/// All aggregates (cards, rollups, series, rankings, trend alerts) are
/// derived from one fetch so they describe the same data. Campaign numbers
/// cover the whole workspace; client rankings are scoped to the viewer.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<DashboardMetrics>, AppError> {
    let user_email = get_user_email(request.headers());
    let viewer = state.resolve_viewer(request.headers());

    let campaigns = state.db.list_all_campaigns()?;
    let clients = state.db.list_clients(&viewer)?;

    let snapshot = metrics::aggregate(&campaigns, &clients);

    // Audit log - read access
    state.db.log_audit(
        &user_email,
        "dashboard",
        Some("metrics"),
        None,
        Some(&format!(
            "campaigns={}, clients={}, avg_roi={:.2}",
            snapshot.total_campaigns,
            clients.len(),
            snapshot.average_roi
        )),
    )?;

    Ok(Json(snapshot))
}
