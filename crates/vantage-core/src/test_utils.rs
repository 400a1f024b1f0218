//! Test utilities for vantage-core
//!
//! This module provides testing infrastructure including a mock Gemini server
//! that can be used for development and integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::{
    extract::{Json, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;

/// Mock Gemini server for testing and development
///
/// Speaks just enough of the Generative Language API surface for the
/// `GeminiBackend`: the model listing endpoint (health checks) and
/// `models/{model}:generateContent`. Requests without an API key are
/// rejected, and an empty prompt yields a reply with no candidates.
pub struct MockGeminiServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGeminiServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/models", get(handle_models))
            .route("/models/:model_call", post(handle_generate));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockGeminiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Model listing endpoint (used by health checks)
async fn handle_models(Query(params): Query<HashMap<String, String>>) -> Response {
    if !has_key(&params) {
        return missing_key_response();
    }
    Json(json!({
        "models": [
            { "name": "models/gemini-2.5-flash" },
            { "name": "models/gemini-1.5-pro" }
        ]
    }))
    .into_response()
}

/// generateContent endpoint
async fn handle_generate(
    Path(model_call): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(request): Json<GenerateContentRequest>,
) -> Response {
    if !has_key(&params) {
        return missing_key_response();
    }
    if !model_call.ends_with(":generateContent") {
        return StatusCode::NOT_FOUND.into_response();
    }

    let prompt = request
        .contents
        .first()
        .and_then(|c| c.parts.first())
        .map(|p| p.text.as_str())
        .unwrap_or_default();

    // Empty prompt: structurally valid reply with nothing in it
    if prompt.trim().is_empty() {
        return Json(json!({ "candidates": [] })).into_response();
    }

    // Match the prompt shapes produced by the prompt library
    let text = if prompt.contains("marketing strategist") {
        "Reallocate budget toward the strongest platform and refresh underperforming creatives weekly."
    } else if prompt.contains("forecast the ROI trend") {
        "ROI should land between 40% and 55% next month; consolidate spend on the top channel."
    } else if prompt.contains("marketing analyst") {
        "This client's campaigns are trending upward; propose a budget increase for the best platform."
    } else {
        "Mock analysis of the provided marketing data."
    };

    Json(json!({
        "candidates": [
            { "content": { "parts": [ { "text": text } ] } }
        ]
    }))
    .into_response()
}

fn has_key(params: &HashMap<String, String>) -> bool {
    params.get("key").map(|k| !k.is_empty()).unwrap_or(false)
}

fn missing_key_response() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": { "message": "API key not valid", "status": "PERMISSION_DENIED" } })),
    )
        .into_response()
}

// Request types for the mock server

#[derive(Debug, Deserialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Deserialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Deserialize)]
struct RequestPart {
    text: String,
}
