//! Client roster handlers
//!
//! All operations are scoped to the resolved viewer: admins see the full
//! roster, owners only the clients they manage.

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    Json,
};

use crate::{get_user_email, AppError, AppState, SuccessResponse};
use vantage_core::models::{Client, NewClient, UpdateClient};

/// GET /api/clients - List clients visible to the viewer
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Vec<Client>>, AppError> {
    let user_email = get_user_email(request.headers());
    let viewer = state.resolve_viewer(request.headers());

    let clients = state.db.list_clients(&viewer)?;

    // Audit log - read access
    state.db.log_audit(
        &user_email,
        "list",
        Some("client"),
        None,
        Some(&format!("count={}", clients.len())),
    )?;

    Ok(Json(clients))
}

/// POST /api/clients - Create a new client
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Client>, AppError> {
    let user_email = get_user_email(request.headers());
    let viewer = state.resolve_viewer(request.headers());

    // Extract JSON body
    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let new: NewClient =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let client = state.db.create_client(&viewer, &new)?;

    // Audit log
    state.db.log_audit(
        &user_email,
        "create",
        Some("client"),
        Some(client.id),
        Some(&format!("name={}, email={}", client.name, client.email)),
    )?;

    Ok(Json(client))
}

/// GET /api/clients/:id - Get a single client
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Client>, AppError> {
    let user_email = get_user_email(request.headers());
    let viewer = state.resolve_viewer(request.headers());

    let client = state
        .db
        .get_client(&viewer, id)?
        .ok_or_else(|| AppError::not_found(&format!("Client {} not found", id)))?;

    state
        .db
        .log_audit(&user_email, "get", Some("client"), Some(id), None)?;

    Ok(Json(client))
}

/// PUT /api/clients/:id - Update a client
///
/// Accepts a partial body; absent fields keep their current value.
pub async fn update_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<Client>, AppError> {
    let user_email = get_user_email(request.headers());
    let viewer = state.resolve_viewer(request.headers());

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let changes: UpdateClient =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let client = state.db.update_client(&viewer, id, &changes)?;

    state.db.log_audit(
        &user_email,
        "update",
        Some("client"),
        Some(id),
        Some(&format!("name={}, email={}", client.name, client.email)),
    )?;

    Ok(Json(client))
}

/// DELETE /api/clients/:id - Delete a client and all of its campaigns
pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user_email = get_user_email(request.headers());
    let viewer = state.resolve_viewer(request.headers());

    // Capture name for the audit trail before the cascade delete
    let client = state
        .db
        .get_client(&viewer, id)?
        .ok_or_else(|| AppError::not_found(&format!("Client {} not found", id)))?;

    state.db.delete_client(&viewer, id)?;

    state.db.log_audit(
        &user_email,
        "delete",
        Some("client"),
        Some(id),
        Some(&format!("name={}", client.name)),
    )?;

    Ok(Json(SuccessResponse { success: true }))
}
