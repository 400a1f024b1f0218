//! Authentication and service status handlers

use std::sync::Arc;

use axum::extract::Request;
use axum::{extract::State, Json};
use serde::Serialize;

use crate::{get_user_email, AppState};

/// Response for the /api/health endpoint
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /api/health - Liveness probe (exempt from authentication)
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Response for the /api/me endpoint
#[derive(Serialize)]
pub struct MeResponse {
    /// The authenticated user's email or identifier
    pub user: String,
    /// How the user was authenticated
    pub auth_method: String,
    /// Data-access role ("admin" sees the full roster, "owner" only their own clients)
    pub role: String,
}

/// GET /api/me - Get the currently authenticated user
pub async fn get_me(State(state): State<Arc<AppState>>, request: Request) -> Json<MeResponse> {
    let headers = request.headers();
    let user = get_user_email(headers);

    let auth_method = if user == "api-key" {
        "api_key"
    } else if user == "local-dev" {
        "none"
    } else {
        "proxy_header"
    };

    let viewer = state.resolve_viewer(headers);
    let role = if viewer.is_admin() { "admin" } else { "owner" };

    Json(MeResponse {
        user,
        auth_method: auth_method.to_string(),
        role: role.to_string(),
    })
}
