//! Pluggable AI insight backend abstraction
//!
//! Insight text (dashboard commentary, ROI forecasts, per-client report
//! narratives) comes from a generative backend behind a narrow interface.
//!
//! # Architecture
//!
//! - `InsightBackend` trait: the interface every backend implements
//! - `InsightClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `MockBackend`
//!
//! # Degradation contract
//!
//! Insight generation is strictly best-effort. [`InsightClient::request_insight`]
//! never fails: backend errors are logged and replaced with a fixed fallback
//! string, so a Gemini outage degrades dashboards and reports instead of
//! breaking them.
//!
//! # Configuration
//!
//! Environment variables:
//! - `INSIGHT_BACKEND`: Backend to use (gemini, mock). Default: gemini
//! - `GEMINI_API_KEY`: API key (required for the gemini backend)
//! - `GEMINI_BASE_URL`: API base URL (default: the public endpoint)
//! - `GEMINI_MODEL`: Model name (default: gemini-2.5-flash)

pub mod gemini;
mod mock;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;

use async_trait::async_trait;
use tracing::warn;

use crate::config::InsightSettings;
use crate::error::Result;

/// Returned when the backend replies without any candidate text
pub const NO_RESPONSE_FALLBACK: &str = "No response from Gemini.";

/// Returned when the backend cannot be reached or rejects the request
pub const CONNECT_FALLBACK: &str = "⚠️ Unable to connect to Gemini API.";

/// Trait defining the interface for all insight backends
///
/// Backends must be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait InsightBackend: Send + Sync {
    /// Generate insight text for a fully rendered prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging and health reporting)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete insight client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum InsightClient {
    /// Google Gemini backend (HTTP API)
    Gemini(GeminiBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl InsightClient {
    /// Create an insight client from environment variables
    ///
    /// Checks `INSIGHT_BACKEND` to determine which backend to use:
    /// - `gemini` (default): requires `GEMINI_API_KEY`
    /// - `mock`: canned responses for testing
    ///
    /// Returns None if the required environment variables are not set;
    /// insight features stay disabled in that case.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("INSIGHT_BACKEND").unwrap_or_else(|_| "gemini".to_string());

        match backend.to_lowercase().as_str() {
            "gemini" => GeminiBackend::from_env().map(InsightClient::Gemini),
            "mock" => Some(InsightClient::Mock(MockBackend::new())),
            _ => {
                warn!(backend = %backend, "Unknown INSIGHT_BACKEND, falling back to gemini");
                GeminiBackend::from_env().map(InsightClient::Gemini)
            }
        }
    }

    /// Create an insight client from config settings
    ///
    /// The API key is still read from `GEMINI_API_KEY`; the config file never
    /// carries it. Returns None when the gemini backend is selected but no
    /// key is present.
    pub fn from_config(settings: &InsightSettings) -> Option<Self> {
        match settings.backend.to_lowercase().as_str() {
            "mock" => Some(InsightClient::Mock(MockBackend::new())),
            "gemini" => {
                let api_key = std::env::var(gemini::API_KEY_ENV)
                    .ok()
                    .filter(|k| !k.trim().is_empty())?;
                Some(InsightClient::Gemini(GeminiBackend::new(
                    &settings.base_url,
                    &settings.model,
                    &api_key,
                )))
            }
            other => {
                warn!(backend = %other, "Unknown insight backend in config, falling back to gemini");
                let api_key = std::env::var(gemini::API_KEY_ENV)
                    .ok()
                    .filter(|k| !k.trim().is_empty())?;
                Some(InsightClient::Gemini(GeminiBackend::new(
                    &settings.base_url,
                    &settings.model,
                    &api_key,
                )))
            }
        }
    }

    /// Create a Gemini backend directly
    pub fn gemini(base_url: &str, model: &str, api_key: &str) -> Self {
        InsightClient::Gemini(GeminiBackend::new(base_url, model, api_key))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        InsightClient::Mock(MockBackend::new())
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            InsightClient::Gemini(b) => InsightClient::Gemini(b.with_model(model)),
            InsightClient::Mock(b) => InsightClient::Mock(b.with_model(model)),
        }
    }

    /// Request insight text, degrading to a fixed fallback on failure
    ///
    /// Backend errors never propagate. A failed call logs a warning and
    /// returns [`CONNECT_FALLBACK`], so callers always have text to show.
    pub async fn request_insight(&self, prompt: &str) -> String {
        match self.generate(prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(model = %self.model(), error = %e, "Insight generation failed");
                CONNECT_FALLBACK.to_string()
            }
        }
    }
}

// Implement InsightBackend for InsightClient by delegating to the inner backend
#[async_trait]
impl InsightBackend for InsightClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            InsightClient::Gemini(b) => b.generate(prompt).await,
            InsightClient::Mock(b) => b.generate(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            InsightClient::Gemini(b) => b.health_check().await,
            InsightClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            InsightClient::Gemini(b) => b.model(),
            InsightClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            InsightClient::Gemini(b) => b.host(),
            InsightClient::Mock(b) => b.host(),
        }
    }
}
