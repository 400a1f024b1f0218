//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use base64::Engine;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;
use vantage_core::db::Database;
use vantage_core::insight::CONNECT_FALLBACK;

fn test_config() -> ServerConfig {
    ServerConfig {
        require_auth: false,
        allowed_origins: vec![],
        ..Default::default()
    }
}

fn setup_test_app() -> Router {
    let db = Database::in_memory().unwrap();
    create_router_with_options(
        db,
        None,
        test_config(),
        Some(InsightClient::mock()),
        None,
        None,
    )
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create a client through the API and return its id
async fn create_test_client(app: &Router, name: &str) -> i64 {
    let body = serde_json::json!({
        "name": name,
        "email": format!("{}@client.test", name.to_lowercase().replace(' ', ".")),
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/clients")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    json["id"].as_i64().unwrap()
}

/// Create a campaign through the API and return its id
///
/// `revenue: Some(..)` creates a completed campaign, `None` an ongoing one.
async fn create_test_campaign(
    app: &Router,
    client_id: i64,
    name: &str,
    budget: f64,
    revenue: Option<f64>,
) -> i64 {
    let body = match revenue {
        Some(rev) => serde_json::json!({
            "name": name,
            "platform": "Meta",
            "budget": budget,
            "revenue": rev,
            "status": "Completed",
            "start_date": "2024-03-01",
            "end_date": "2024-03-31",
            "client_id": client_id,
        }),
        None => serde_json::json!({
            "name": name,
            "platform": "Meta",
            "budget": budget,
            "start_date": "2024-03-01",
            "client_id": client_id,
        }),
    };

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/campaigns")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    json["id"].as_i64().unwrap()
}

/// Just enough of a PNG header for dimension parsing
fn fake_png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes
}

fn png_data_url(width: u32, height: u32) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(fake_png(width, height))
    )
}

// ========== Health & Identity Tests ==========

#[tokio::test]
async fn test_health() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_health_exempt_from_auth() {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: true,
        allowed_origins: vec![],
        ..Default::default()
    };
    let app = create_router(db, None, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Liveness probes pass without any identity
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_me_local_dev() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["user"], "local-dev");
    assert_eq!(json["auth_method"], "none");
    assert_eq!(json["role"], "admin");
}

#[tokio::test]
async fn test_me_identity_header_roles() {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: true,
        admin_emails: vec!["boss@agency.test".to_string()],
        allowed_origins: vec![],
        ..Default::default()
    };
    let app = create_router(db, None, config);

    // Non-admin email resolves to the owner role
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header("x-vantage-user", "sam@agency.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["user"], "sam@agency.test");
    assert_eq!(json["auth_method"], "proxy_header");
    assert_eq!(json["role"], "owner");

    // Configured admin email gets the admin role, case-insensitively
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header("x-vantage-user", "Boss@Agency.Test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["role"], "admin");
}

// ========== Authentication Tests ==========

#[tokio::test]
async fn test_auth_required() {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: true, // Auth required
        allowed_origins: vec![],
        ..Default::default()
    };
    let app = create_router(db, None, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/clients")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Should get 401 without the identity header
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_with_header() {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: true,
        allowed_origins: vec![],
        ..Default::default()
    };
    let app = create_router(db, None, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/clients")
                .header("x-vantage-user", "test@agency.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_empty_header() {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: true,
        allowed_origins: vec![],
        ..Default::default()
    };
    let app = create_router(db, None, config);

    // Empty string header should be rejected (defense in depth)
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/clients")
                .header("x-vantage-user", "")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_api_key() {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: true,
        api_key: Some("test-api-key-12345".to_string()),
        allowed_origins: vec![],
        ..Default::default()
    };
    let app = create_router(db, None, config);

    // Valid key passes
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/clients")
                .header("authorization", "Bearer test-api-key-12345")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Wrong key is rejected
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/clients")
                .header("authorization", "Bearer wrong-key-00000000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ========== Client API Tests ==========

#[tokio::test]
async fn test_create_and_list_clients() {
    let app = setup_test_app();

    let id = create_test_client(&app, "Acme Coffee").await;
    assert!(id > 0);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/clients")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let clients = json.as_array().unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0]["name"], "Acme Coffee");
    assert_eq!(clients[0]["membership"], "Silver");
    assert_eq!(clients[0]["is_active"], true);
}

#[tokio::test]
async fn test_create_client_missing_name() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "name": "  ",
        "email": "someone@client.test",
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/clients")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Client name is required");
}

#[tokio::test]
async fn test_get_client_not_found() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/clients/999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_client_partial() {
    let app = setup_test_app();
    let id = create_test_client(&app, "Acme Coffee").await;

    // Only send the fields being changed
    let body = serde_json::json!({
        "company": "Acme Coffee Roasters LLC",
        "membership": "Gold",
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/clients/{}", id))
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["name"], "Acme Coffee"); // unchanged
    assert_eq!(json["company"], "Acme Coffee Roasters LLC");
    assert_eq!(json["membership"], "Gold");
}

#[tokio::test]
async fn test_delete_client_cascades() {
    let app = setup_test_app();
    let id = create_test_client(&app, "Acme Coffee").await;
    create_test_campaign(&app, id, "Spring Sale", 1000.0, Some(1500.0)).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/clients/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["success"], true);

    // Client is gone
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/clients/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // And so are its campaigns
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/campaigns")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_owner_sees_only_own_clients() {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: true,
        admin_emails: vec!["boss@agency.test".to_string()],
        allowed_origins: vec![],
        ..Default::default()
    };
    let app = create_router(db, None, config);

    // sam creates a client
    let body = serde_json::json!({
        "name": "Acme Coffee",
        "email": "hello@acme.test",
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/clients")
                .header("x-vantage-user", "sam@agency.test")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // alex sees an empty roster
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/clients")
                .header("x-vantage-user", "alex@agency.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 0);

    // the admin sees everything
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/clients")
                .header("x-vantage-user", "boss@agency.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

// ========== Campaign API Tests ==========

#[tokio::test]
async fn test_create_and_get_campaign() {
    let app = setup_test_app();
    let client_id = create_test_client(&app, "Acme Coffee").await;

    let id = create_test_campaign(&app, client_id, "Spring Sale", 1000.0, Some(1500.0)).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/campaigns/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["name"], "Spring Sale");
    assert_eq!(json["platform"], "Meta");
    assert_eq!(json["status"], "Completed");
    assert_eq!(json["budget"].as_f64().unwrap(), 1000.0);
    assert_eq!(json["revenue"].as_f64().unwrap(), 1500.0);
}

#[tokio::test]
async fn test_create_campaign_unknown_client() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "name": "Orphan",
        "budget": 100.0,
        "start_date": "2024-03-01",
        "client_id": 42,
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/campaigns")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_campaign_negative_budget() {
    let app = setup_test_app();
    let client_id = create_test_client(&app, "Acme Coffee").await;

    let body = serde_json::json!({
        "name": "Bad Budget",
        "budget": -50.0,
        "start_date": "2024-03-01",
        "client_id": client_id,
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/campaigns")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_complete_campaign() {
    let app = setup_test_app();
    let client_id = create_test_client(&app, "Acme Coffee").await;
    let id = create_test_campaign(&app, client_id, "Brand Push", 500.0, None).await;

    let body = serde_json::json!({ "revenue": 800.0 });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/campaigns/{}/complete", id))
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "Completed");
    assert_eq!(json["revenue"].as_f64().unwrap(), 800.0);
}

#[tokio::test]
async fn test_list_campaigns_includes_client_name() {
    let app = setup_test_app();
    let client_id = create_test_client(&app, "Acme Coffee").await;
    create_test_campaign(&app, client_id, "Spring Sale", 1000.0, Some(1500.0)).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/campaigns")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let campaigns = json.as_array().unwrap();
    assert_eq!(campaigns.len(), 1);
    assert_eq!(campaigns[0]["client_name"], "Acme Coffee");
}

#[tokio::test]
async fn test_delete_campaign() {
    let app = setup_test_app();
    let client_id = create_test_client(&app, "Acme Coffee").await;
    let id = create_test_campaign(&app, client_id, "Spring Sale", 1000.0, None).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/campaigns/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/campaigns/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Dashboard API Tests ==========

#[tokio::test]
async fn test_dashboard_empty() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_campaigns"], 0);
    assert_eq!(json["average_roi"].as_f64().unwrap(), 0.0);
    assert_eq!(json["platform_rollups"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_dashboard_metrics() {
    let app = setup_test_app();
    let client_id = create_test_client(&app, "Acme Coffee").await;

    // Completed: ROI (1500-1000)/1000 = +50%. Ongoing: counts as zero
    // revenue, ROI -100%.
    create_test_campaign(&app, client_id, "Spring Sale", 1000.0, Some(1500.0)).await;
    create_test_campaign(&app, client_id, "Brand Push", 500.0, None).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["total_campaigns"], 2);
    assert_eq!(json["active_campaigns"], 1);
    assert_eq!(json["total_budget"].as_f64().unwrap(), 1500.0);
    assert_eq!(json["total_revenue"].as_f64().unwrap(), 1500.0);
    // Mean of per-campaign ROIs: (50 + -100) / 2
    assert_eq!(json["average_roi"].as_f64().unwrap(), -25.0);

    // Both campaigns share one platform rollup
    let rollups = json["platform_rollups"].as_array().unwrap();
    assert_eq!(rollups.len(), 1);
    assert_eq!(rollups[0]["platform"], "Meta");
    assert_eq!(rollups[0]["budget"].as_f64().unwrap(), 1500.0);

    // Trend summary names both ends of the ranking
    let summary = json["trends"]["summary"].as_str().unwrap();
    assert!(summary.contains("Spring Sale"));
    assert!(summary.contains("Brand Push"));
}

// ========== Insight API Tests ==========

#[tokio::test]
async fn test_dashboard_insight_with_mock() {
    let app = setup_test_app();
    let client_id = create_test_client(&app, "Acme Coffee").await;
    create_test_campaign(&app, client_id, "Spring Sale", 1000.0, Some(1500.0)).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/insights/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["model"], "mock");
    let insight = json["insight"].as_str().unwrap();
    assert!(!insight.is_empty());
    assert_ne!(insight, CONNECT_FALLBACK);
}

#[tokio::test]
async fn test_insight_without_backend() {
    let db = Database::in_memory().unwrap();
    let app = create_router_with_options(db, None, test_config(), None, None, None);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/insights/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Degrades to the fallback text instead of failing
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["insight"], CONNECT_FALLBACK);
    assert!(json["model"].is_null());
}

#[tokio::test]
async fn test_forecast_insight() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/insights/forecast")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["model"], "mock");
    assert!(!json["insight"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_insight_health() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/insight/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["configured"], true);
    assert_eq!(json["available"], true);
    assert_eq!(json["model"], "mock");
}

#[tokio::test]
async fn test_insight_health_unconfigured() {
    let db = Database::in_memory().unwrap();
    let app = create_router_with_options(db, None, test_config(), None, None, None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/insight/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["configured"], false);
    assert_eq!(json["available"], false);
    assert!(json["model"].is_null());
}

// ========== Report API Tests ==========

#[tokio::test]
async fn test_get_client_report() {
    let app = setup_test_app();
    let client_id = create_test_client(&app, "Acme Coffee").await;
    create_test_campaign(&app, client_id, "Spring Sale", 1000.0, Some(1500.0)).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/clients/{}/report", client_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["client"]["name"], "Acme Coffee");
    assert_eq!(json["campaign_count"], 1);
    assert_eq!(json["average_roi"].as_f64().unwrap(), 50.0);
    // Without ?insight=true the report carries the placeholder
    assert_eq!(json["insight"], "No AI insight generated yet.");
}

#[tokio::test]
async fn test_get_client_report_with_insight() {
    let app = setup_test_app();
    let client_id = create_test_client(&app, "Acme Coffee").await;
    create_test_campaign(&app, client_id, "Spring Sale", 1000.0, Some(1500.0)).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/clients/{}/report?insight=true", client_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let insight = json["insight"].as_str().unwrap();
    assert!(!insight.is_empty());
    assert_ne!(insight, "No AI insight generated yet.");
}

#[tokio::test]
async fn test_report_not_found() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/clients/999/report")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_export_report_writes_document() {
    let reports_dir = TempDir::new().unwrap();
    let db = Database::in_memory().unwrap();
    let app = create_router_with_options(
        db,
        None,
        test_config(),
        None,
        None,
        Some(reports_dir.path().to_path_buf()),
    );

    let body = serde_json::json!({
        "name": "Acme Coffee",
        "email": "hello@acme.test",
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/clients")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    let client_id = get_body_json(response).await["id"].as_i64().unwrap();

    // 800x2000 px scales to 190x475 mm, which needs two A4 pages
    let body = serde_json::json!({
        "capture": png_data_url(800, 2000),
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/clients/{}/report/export", client_id))
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["file_name"], "Acme-Coffee_Report.json");
    assert_eq!(json["pages"], 2);

    let written = reports_dir.path().join("Acme-Coffee_Report.json");
    assert!(written.exists());
}

#[tokio::test]
async fn test_export_report_rejects_bad_capture() {
    let app = setup_test_app();
    let client_id = create_test_client(&app, "Acme Coffee").await;

    let body = serde_json::json!({
        "capture": "not-a-data-url",
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/clients/{}/report/export", client_id))
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
}

// ========== Import API Tests ==========

fn multipart_body(boundary: &str, client_id: i64, format: Option<&str>, csv: &str) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "--{}\r\nContent-Disposition: form-data; name=\"client_id\"\r\n\r\n{}\r\n",
        boundary, client_id
    ));
    if let Some(fmt) = format {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"format\"\r\n\r\n{}\r\n",
            boundary, fmt
        ));
    }
    body.push_str(&format!(
        "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"export.csv\"\r\nContent-Type: text/csv\r\n\r\n{}\r\n--{}--\r\n",
        boundary, csv, boundary
    ));
    body
}

const META_CSV: &str = "Campaign name,Amount spent (USD),Purchases conversion value,Ad delivery,Reporting starts,Reporting ends\n\
Spring Sale,1000,1500,inactive,2024-03-01,2024-03-31\n\
Brand Push,500,,active,2024-04-01,\n";

#[tokio::test]
async fn test_import_meta_csv() {
    let app = setup_test_app();
    let client_id = create_test_client(&app, "Acme Coffee").await;

    let boundary = "vantage-test-boundary";
    let body = multipart_body(boundary, client_id, None, META_CSV);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import/campaigns")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body.clone()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["stats"]["imported"], 2);
    assert_eq!(json["stats"]["skipped"], 0);
    assert_eq!(json["format"], "meta");
    assert_eq!(json["client_name"], "Acme Coffee");

    // Re-importing the same file is idempotent
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import/campaigns")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["stats"]["imported"], 0);
    assert_eq!(json["stats"]["skipped"], 2);

    // Imported rows are real campaigns
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/campaigns")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_import_google_csv_explicit_format() {
    let app = setup_test_app();
    let client_id = create_test_client(&app, "Acme Coffee").await;

    let csv = "Campaign,Cost,Conv. value,Campaign state,Start date,End date\n\
Search Q2,800,1200,paused,2024-04-01,2024-06-30\n";

    let boundary = "vantage-test-boundary";
    let body = multipart_body(boundary, client_id, Some("google"), csv);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import/campaigns")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["stats"]["imported"], 1);
    assert_eq!(json["format"], "google");
}

#[tokio::test]
async fn test_import_unrecognized_format() {
    let app = setup_test_app();
    let client_id = create_test_client(&app, "Acme Coffee").await;

    let boundary = "vantage-test-boundary";
    let body = multipart_body(boundary, client_id, None, "some,random,columns\n1,2,3\n");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import/campaigns")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_missing_file() {
    let app = setup_test_app();
    let client_id = create_test_client(&app, "Acme Coffee").await;

    let boundary = "vantage-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"client_id\"\r\n\r\n{id}\r\n--{b}--\r\n",
        b = boundary,
        id = client_id
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import/campaigns")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Missing file field");
}

#[tokio::test]
async fn test_import_unknown_client() {
    let app = setup_test_app();

    let boundary = "vantage-test-boundary";
    let body = multipart_body(boundary, 42, None, META_CSV);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import/campaigns")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Export API Tests ==========

#[tokio::test]
async fn test_export_campaigns_csv() {
    let app = setup_test_app();
    let client_id = create_test_client(&app, "Acme Coffee").await;
    create_test_campaign(&app, client_id, "Spring Sale", 1000.0, Some(1500.0)).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/export/campaigns.csv")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers().get("content-disposition").unwrap(),
        "attachment; filename=\"campaigns.csv\""
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "id,client,name,platform,status,budget,revenue,roi,start_date,end_date"
    );
    let row = lines.next().unwrap();
    assert!(row.contains("Spring Sale"));
    assert!(row.contains("50.00"));
}

#[tokio::test]
async fn test_export_campaigns_csv_status_filter() {
    let app = setup_test_app();
    let client_id = create_test_client(&app, "Acme Coffee").await;
    create_test_campaign(&app, client_id, "Spring Sale", 1000.0, Some(1500.0)).await;
    create_test_campaign(&app, client_id, "Brand Push", 500.0, None).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/export/campaigns.csv?status=ongoing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(csv.contains("Brand Push"));
    assert!(!csv.contains("Spring Sale"));

    // Unknown status is a client error
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/export/campaigns.csv?status=paused")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_clients_csv() {
    let app = setup_test_app();
    create_test_client(&app, "Acme Coffee").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/export/clients.csv")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "id,name,email,phone,company,membership,active,campaigns,manager"
    );
    assert!(lines.next().unwrap().contains("Acme Coffee"));
}

// ========== Audit API Tests ==========

#[tokio::test]
async fn test_audit_records_actions() {
    let app = setup_test_app();
    create_test_client(&app, "Acme Coffee").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/audit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert!(json["total"].as_i64().unwrap() >= 1);
    let entries = json["entries"].as_array().unwrap();
    assert!(entries
        .iter()
        .any(|e| e["action"] == "create" && e["entity_type"] == "client"));
}

#[tokio::test]
async fn test_audit_requires_admin() {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: true,
        admin_emails: vec!["boss@agency.test".to_string()],
        allowed_origins: vec![],
        ..Default::default()
    };
    let app = create_router(db, None, config);

    // Owners cannot read the audit log
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/audit")
                .header("x-vantage-user", "sam@agency.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admins can
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/audit")
                .header("x-vantage-user", "boss@agency.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ========== Backup API Tests ==========

#[tokio::test]
async fn test_backup_lifecycle() {
    let backup_dir = TempDir::new().unwrap();
    let db = Database::in_memory().unwrap();
    let app = create_router_with_options(
        db,
        None,
        test_config(),
        None,
        Some(backup_dir.path().to_path_buf()),
        None,
    );

    // Create
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/backups")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let name = json["name"].as_str().unwrap().to_string();
    assert!(name.starts_with("vantage-"));
    assert!(name.ends_with(".db.gz"));
    assert_eq!(json["compressed"], true);

    // List
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/backups")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let backups = json.as_array().unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(backups[0]["name"], name);

    // Prune keeping zero deletes it
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/backups/prune")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"keep": 0}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["deleted_count"], 1);
    assert_eq!(json["retained_count"], 0);
}

#[tokio::test]
async fn test_list_backups_missing_dir() {
    let tmp = TempDir::new().unwrap();
    let db = Database::in_memory().unwrap();
    let app = create_router_with_options(
        db,
        None,
        test_config(),
        None,
        Some(tmp.path().join("never-created")),
        None,
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/backups")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_backups_require_admin() {
    let db = Database::in_memory().unwrap();
    let config = ServerConfig {
        require_auth: true,
        admin_emails: vec!["boss@agency.test".to_string()],
        allowed_origins: vec![],
        ..Default::default()
    };
    let app = create_router(db, None, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/backups")
                .header("x-vantage-user", "sam@agency.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ========== Security Header Tests ==========

#[tokio::test]
async fn test_security_headers_present() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.get("content-security-policy").is_some());
}
