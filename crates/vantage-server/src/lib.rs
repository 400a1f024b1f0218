//! Vantage Web Server
//!
//! Axum-based REST API for the Vantage agency dashboard.
//!
//! Security features:
//! - Identity-header authentication behind a fronting auth proxy (secure by
//!   default, use --no-auth for local dev)
//! - Restrictive CORS policy
//! - Input validation (pagination limits, file size limits)
//! - Full audit logging for all API access (reads and writes)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use vantage_core::insight::InsightBackend;
use vantage_core::models::Viewer;
use vantage_core::{Database, InsightClient};

mod handlers;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Identity header set by the fronting auth proxy
const VANTAGE_USER_HEADER: &str = "x-vantage-user";

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Emails granted the admin role (full visibility over every client)
    pub admin_emails: Vec<String>,
    /// API key for non-interactive service access (alternative to the
    /// identity header). Format: "Bearer <key>" in Authorization header.
    pub api_key: Option<String>,
    /// Allowed CORS origins (empty = same-origin only in production)
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            admin_emails: vec![],
            api_key: None,
            allowed_origins: vec![],
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    /// AI insight backend; None disables insight generation
    pub insight: Option<InsightClient>,
    /// Optional override for backup directory (for testing)
    pub backup_dir: Option<std::path::PathBuf>,
    /// Directory where exported report documents are written
    pub reports_dir: std::path::PathBuf,
}

impl AppState {
    /// Resolve the requesting viewer from the identity headers.
    ///
    /// Emails listed in `admin_emails` get the admin role. API-key and
    /// local-dev identities act as the agency itself, so they are admin too.
    pub fn resolve_viewer(&self, headers: &HeaderMap) -> Viewer {
        let email = get_user_email(headers);
        if email == "api-key" || email == "local-dev" {
            return Viewer::admin(email);
        }
        let lowered = email.to_lowercase();
        if self
            .config
            .admin_emails
            .iter()
            .any(|a| a.to_lowercase() == lowered)
        {
            Viewer::admin(email)
        } else {
            Viewer::owner(email)
        }
    }
}

/// Authentication middleware - validates the identity header or an API key
///
/// # Security Notes
///
/// **Identity header**: The `X-Vantage-User` header is set by the fronting
/// auth proxy, which strips the header from inbound traffic before adding
/// its own. It can be spoofed if the server is exposed directly to the
/// internet, so never run it there without the proxy.
///
/// **API keys**: Compared using constant-time comparison to prevent timing
/// attacks.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    // Liveness probes carry no identity
    if request.uri().path() == "/api/health" {
        return next.run(request).await;
    }

    // Check for the proxy-set identity header
    let user = request
        .headers()
        .get(VANTAGE_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());

    if let Some(email) = user {
        info!(user = %email, path = %request.uri().path(), "Authenticated via identity header");
        return next.run(request).await;
    }

    // Check for API key in Authorization header (Bearer token)
    // Uses constant-time comparison to prevent timing attacks
    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .zip(state.config.api_key.as_deref())
        .map(|(provided, valid)| validate_api_key(provided, valid))
        .unwrap_or(false);

    if api_key_valid {
        info!(user = "api-key", path = %request.uri().path(), "Authenticated via API key");
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid auth");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Validate an API key against the configured key using constant-time
/// comparison to prevent timing attacks.
fn validate_api_key(provided: &str, valid: &str) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();
    let valid_bytes = valid.as_bytes();
    // Only compare if lengths match (constant-time for same-length keys)
    provided_bytes.len() == valid_bytes.len() && bool::from(provided_bytes.ct_eq(valid_bytes))
}

/// Extract user email from request headers (for audit logging)
/// Returns the proxy-set email, "api-key" for API key auth, or "local-dev"
/// for unauthenticated
pub fn get_user_email(headers: &HeaderMap) -> String {
    if let Some(email) = headers
        .get(VANTAGE_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
    {
        return email.to_string();
    }

    // Check for API key (returns "api-key" as the user identifier)
    if headers
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .is_some()
    {
        return "api-key".to_string();
    }

    "local-dev".to_string()
}

/// Resolve the viewer and reject non-admins
pub(crate) fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<Viewer, AppError> {
    let viewer = state.resolve_viewer(headers);
    if !viewer.is_admin() {
        return Err(AppError::forbidden("Admin access required"));
    }
    Ok(viewer)
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(db: Database, static_dir: Option<&str>, config: ServerConfig) -> Router {
    let insight = InsightClient::from_env();
    create_router_with_options(db, static_dir, config, insight, None, None)
}

/// Create the application router with additional options (for testing)
pub fn create_router_with_options(
    db: Database,
    static_dir: Option<&str>,
    config: ServerConfig,
    insight: Option<InsightClient>,
    backup_dir: Option<std::path::PathBuf>,
    reports_dir: Option<std::path::PathBuf>,
) -> Router {
    match &insight {
        Some(client) => {
            info!(
                "Insight backend configured: {} (model: {})",
                client.host(),
                client.model()
            );
        }
        None => {
            info!("ℹ️  Insight backend not configured (set GEMINI_API_KEY to enable AI insights)");
        }
    }

    // Default report export directory relative to working directory
    let reports_dir = reports_dir.unwrap_or_else(|| std::path::PathBuf::from("reports"));

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        insight,
        backup_dir,
        reports_dir,
    });

    let api_routes = Router::new()
        // Health and identity
        .route("/health", get(handlers::health))
        .route("/me", get(handlers::get_me))
        // Dashboard
        .route("/dashboard", get(handlers::get_dashboard))
        // Clients
        .route(
            "/clients",
            get(handlers::list_clients).post(handlers::create_client),
        )
        .route(
            "/clients/:id",
            get(handlers::get_client)
                .put(handlers::update_client)
                .delete(handlers::delete_client),
        )
        // Client reports
        .route("/clients/:id/report", get(handlers::get_client_report))
        .route(
            "/clients/:id/report/export",
            post(handlers::export_client_report),
        )
        // Campaigns
        .route(
            "/campaigns",
            get(handlers::list_campaigns).post(handlers::create_campaign),
        )
        .route(
            "/campaigns/:id",
            get(handlers::get_campaign)
                .put(handlers::update_campaign)
                .delete(handlers::delete_campaign),
        )
        .route(
            "/campaigns/:id/complete",
            post(handlers::complete_campaign),
        )
        // AI insights
        .route("/insights/dashboard", post(handlers::dashboard_insight))
        .route("/insights/forecast", post(handlers::forecast_insight))
        .route("/insight/health", get(handlers::insight_health))
        // Import
        .route("/import/campaigns", post(handlers::import_campaigns))
        // Export
        .route(
            "/export/campaigns.csv",
            get(handlers::export_campaigns_csv),
        )
        .route("/export/clients.csv", get(handlers::export_clients_csv))
        // Audit log
        .route("/audit", get(handlers::list_audit_log))
        // Backup management
        .route(
            "/backups",
            get(handlers::list_backups).post(handlers::create_backup),
        )
        .route("/backups/prune", post(handlers::prune_backups));

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        // Allow specified origins
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    // Security headers
    // CSP: restrict scripts to same-origin, allow inline styles (Tailwind), allow blob: for images
    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' blob: data:; font-src 'self'; connect-src 'self'; frame-ancestors 'none'"
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
) -> anyhow::Result<()> {
    serve_with_config(
        db,
        host,
        port,
        static_dir,
        ServerConfig::default(),
        InsightClient::from_env(),
        None,
    )
    .await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
    insight: Option<InsightClient>,
    backup_dir: Option<std::path::PathBuf>,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    }

    check_insight_connection(&insight).await;

    let app = create_router_with_options(db, static_dir, config, insight, backup_dir, None);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log insight backend connection status
async fn check_insight_connection(insight: &Option<InsightClient>) {
    match insight {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ Insight backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  Insight backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("ℹ️  Insight backend not configured (set GEMINI_API_KEY to enable AI insights)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn forbidden(msg: &str) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<vantage_core::Error> for AppError {
    /// Map core errors onto HTTP statuses. Client-caused failures keep their
    /// message; everything else is logged and replaced with a generic one.
    fn from(err: vantage_core::Error) -> Self {
        use vantage_core::Error as CoreError;

        match err {
            CoreError::NotFound(msg) => Self {
                status: StatusCode::NOT_FOUND,
                message: msg,
                internal: None,
            },
            CoreError::Validation(msg) => Self {
                status: StatusCode::BAD_REQUEST,
                message: msg,
                internal: None,
            },
            CoreError::Import(msg) => Self {
                status: StatusCode::BAD_REQUEST,
                message: format!("Import error: {}", msg),
                internal: None,
            },
            CoreError::UnsupportedFormat(msg) => Self {
                status: StatusCode::BAD_REQUEST,
                message: format!("Unsupported spreadsheet format: {}", msg),
                internal: None,
            },
            CoreError::Precondition(msg) => Self {
                status: StatusCode::PRECONDITION_FAILED,
                message: msg,
                internal: None,
            },
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                // Keep full error for logging
                internal: Some(other.into()),
            },
        }
    }
}

#[cfg(test)]
mod tests;
