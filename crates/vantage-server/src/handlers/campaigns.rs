//! Campaign management handlers
//!
//! Campaigns are shared workspace data: every authenticated identity sees the
//! same campaign list, regardless of client ownership.

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    Json,
};
use serde::Deserialize;

use crate::{get_user_email, AppError, AppState, SuccessResponse};
use vantage_core::models::{Campaign, CampaignWithClient, NewCampaign, UpdateCampaign};

/// GET /api/campaigns - List all campaigns with client names, newest first
pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Vec<CampaignWithClient>>, AppError> {
    let user_email = get_user_email(request.headers());

    let campaigns = state.db.list_campaigns()?;

    // Audit log - read access
    state.db.log_audit(
        &user_email,
        "list",
        Some("campaign"),
        None,
        Some(&format!("count={}", campaigns.len())),
    )?;

    Ok(Json(campaigns))
}

/// POST /api/campaigns - Create a new campaign
pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Campaign>, AppError> {
    let user_email = get_user_email(request.headers());
    let viewer = state.resolve_viewer(request.headers());

    // Extract JSON body
    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let new: NewCampaign =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    // Verify the target client exists and is visible to the viewer
    state
        .db
        .get_client(&viewer, new.client_id)?
        .ok_or_else(|| AppError::not_found(&format!("Client {} not found", new.client_id)))?;

    let campaign = state.db.create_campaign(&new)?;

    // Audit log
    state.db.log_audit(
        &user_email,
        "create",
        Some("campaign"),
        Some(campaign.id),
        Some(&format!(
            "name={}, client_id={}, budget={}",
            campaign.name, campaign.client_id, campaign.budget
        )),
    )?;

    Ok(Json(campaign))
}

/// GET /api/campaigns/:id - Get a single campaign
pub async fn get_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Campaign>, AppError> {
    let user_email = get_user_email(request.headers());

    let campaign = state
        .db
        .get_campaign(id)?
        .ok_or_else(|| AppError::not_found(&format!("Campaign {} not found", id)))?;

    state
        .db
        .log_audit(&user_email, "get", Some("campaign"), Some(id), None)?;

    Ok(Json(campaign))
}

/// PUT /api/campaigns/:id - Replace a campaign's fields
pub async fn update_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Campaign>, AppError> {
    let user_email = get_user_email(request.headers());

    // Verify campaign exists
    state
        .db
        .get_campaign(id)?
        .ok_or_else(|| AppError::not_found(&format!("Campaign {} not found", id)))?;

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let changes: UpdateCampaign =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let campaign = state.db.update_campaign(id, &changes)?;

    state.db.log_audit(
        &user_email,
        "update",
        Some("campaign"),
        Some(id),
        Some(&format!(
            "name={}, status={}, budget={}",
            campaign.name, campaign.status, campaign.budget
        )),
    )?;

    Ok(Json(campaign))
}

/// Request body for completing a campaign
#[derive(Debug, Deserialize)]
pub struct CompleteCampaignRequest {
    /// Final revenue attributed to the campaign
    pub revenue: f64,
}

/// POST /api/campaigns/:id/complete - Mark a campaign completed with its final revenue
pub async fn complete_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Campaign>, AppError> {
    let user_email = get_user_email(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: CompleteCampaignRequest =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let campaign = state.db.complete_campaign(id, req.revenue)?;

    state.db.log_audit(
        &user_email,
        "complete",
        Some("campaign"),
        Some(id),
        Some(&format!("revenue={}", req.revenue)),
    )?;

    Ok(Json(campaign))
}

/// DELETE /api/campaigns/:id - Delete a campaign
pub async fn delete_campaign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_email = get_user_email(request.headers());

    // Capture name for the audit trail
    let campaign = state
        .db
        .get_campaign(id)?
        .ok_or_else(|| AppError::not_found(&format!("Campaign {} not found", id)))?;

    state.db.delete_campaign(id)?;

    state.db.log_audit(
        &user_email,
        "delete",
        Some("campaign"),
        Some(id),
        Some(&format!("name={}", campaign.name)),
    )?;

    Ok(Json(SuccessResponse { success: true }))
}
