//! AI insight handlers
//!
//! Insight generation degrades instead of failing: when no backend is
//! configured or a call fails, the response carries the fixed fallback text
//! and the endpoint still returns 200.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    Json,
};
use serde::Serialize;

use crate::{get_user_email, AppError, AppState};
use vantage_core::insight::{InsightBackend, CONNECT_FALLBACK};
use vantage_core::prompts::{dashboard_insight_prompt, roi_forecast_prompt};
use vantage_core::{metrics, PromptLibrary};

/// Response carrying generated insight text
#[derive(Debug, Serialize)]
pub struct InsightResponse {
    /// Generated text, or the fallback message when the backend is unreachable
    pub insight: String,
    /// Model that produced the text; None when no backend is configured
    pub model: Option<String>,
}

/// Response for the insight backend health endpoint
#[derive(Debug, Serialize)]
pub struct InsightHealthResponse {
    /// Whether an insight backend is configured at all
    pub configured: bool,
    /// Live reachability of the configured backend
    pub available: bool,
    pub host: Option<String>,
    pub model: Option<String>,
}

/// POST /api/insights/dashboard - Generate a strategist take on the dashboard
pub async fn dashboard_insight(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<InsightResponse>, AppError> {
    let user_email = get_user_email(request.headers());
    let viewer = state.resolve_viewer(request.headers());

    let campaigns = state.db.list_all_campaigns()?;
    let clients = state.db.list_clients(&viewer)?;
    let snapshot = metrics::aggregate(&campaigns, &clients);

    let mut prompt_lib = PromptLibrary::new();
    let prompt = dashboard_insight_prompt(&mut prompt_lib, &snapshot)?;

    let (insight, model) = match &state.insight {
        Some(client) => (
            client.request_insight(&prompt).await,
            Some(client.model().to_string()),
        ),
        None => (CONNECT_FALLBACK.to_string(), None),
    };

    state.db.log_audit(
        &user_email,
        "insight",
        Some("dashboard"),
        None,
        Some(&format!(
            "model={}, chars={}",
            model.as_deref().unwrap_or("none"),
            insight.len()
        )),
    )?;

    Ok(Json(InsightResponse { insight, model }))
}

/// POST /api/insights/forecast - Generate a next-month ROI forecast
pub async fn forecast_insight(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<InsightResponse>, AppError> {
    let user_email = get_user_email(request.headers());
    let viewer = state.resolve_viewer(request.headers());

    let campaigns = state.db.list_all_campaigns()?;
    let clients = state.db.list_clients(&viewer)?;
    let snapshot = metrics::aggregate(&campaigns, &clients);

    let mut prompt_lib = PromptLibrary::new();
    let prompt = roi_forecast_prompt(&mut prompt_lib, &snapshot)?;

    let (insight, model) = match &state.insight {
        Some(client) => (
            client.request_insight(&prompt).await,
            Some(client.model().to_string()),
        ),
        None => (CONNECT_FALLBACK.to_string(), None),
    };

    state.db.log_audit(
        &user_email,
        "insight",
        Some("forecast"),
        None,
        Some(&format!(
            "model={}, chars={}",
            model.as_deref().unwrap_or("none"),
            insight.len()
        )),
    )?;

    Ok(Json(InsightResponse { insight, model }))
}

/// GET /api/insight/health - Insight backend health status
pub async fn insight_health(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<InsightHealthResponse>, AppError> {
    let user_email = get_user_email(request.headers());

    let mut health = InsightHealthResponse {
        configured: false,
        available: false,
        host: None,
        model: None,
    };

    // Live reachability check against the configured backend
    if let Some(ref client) = state.insight {
        health.configured = true;
        health.available = client.health_check().await;
        health.host = Some(client.host().to_string());
        health.model = Some(client.model().to_string());
    }

    state.db.log_audit(
        &user_email,
        "insight",
        Some("health"),
        None,
        Some(&format!(
            "configured={}, available={}",
            health.configured, health.available
        )),
    )?;

    Ok(Json(health))
}
