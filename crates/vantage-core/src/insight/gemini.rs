//! Gemini backend implementation
//!
//! HTTP client for the Google Generative Language API. One `generateContent`
//! call per insight; no retries, no streaming, transport-default timeouts.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::{InsightBackend, NO_RESPONSE_FALLBACK};

/// Default Generative Language API endpoint
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for insight generation
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Gemini backend
///
/// Calls `models/{model}:generateContent` with the API key passed as a query
/// parameter. The key is only ever read from the environment, never from a
/// config file.
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            model: model.to_string(),
            api_key: self.api_key.clone(),
        }
    }

    /// Create from environment variables
    ///
    /// Returns None when `GEMINI_API_KEY` is unset or blank.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Some(Self::new(&base_url, &model, &api_key))
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

/// Request to the generateContent endpoint
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

/// Response from the generateContent endpoint
///
/// Every level is optional: a structurally valid reply with no text (safety
/// blocks, empty candidates) is a normal outcome, not a parse error.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Pull the first candidate's first text part, if any
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .and_then(|parts| parts.into_iter().next())
        .and_then(|part| part.text)
}

#[async_trait]
impl InsightBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .http_client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Http(response.error_for_status().unwrap_err()));
        }

        let reply: GenerateContentResponse = response.json().await?;

        match extract_text(reply) {
            Some(text) => {
                debug!(model = %self.model, chars = text.len(), "Gemini insight generated");
                Ok(text)
            }
            // A reply with no text is still a reply; only transport and
            // status failures surface as errors.
            None => Ok(NO_RESPONSE_FALLBACK.to_string()),
        }
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/models?key={}", self.base_url, self.api_key))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
