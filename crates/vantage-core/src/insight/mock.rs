//! Mock backend for testing
//!
//! Canned insight responses without a network dependency. The failing mode
//! exercises the degradation path that a real Gemini outage would take.

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::InsightBackend;

/// Mock insight backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Whether generate should return an error
    pub failing: bool,
    /// Fixed response text; None picks a canned line from the prompt
    pub canned: Option<String>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            failing: false,
            canned: None,
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            failing: false,
            canned: None,
        }
    }

    /// Create a mock backend whose generate calls always fail
    pub fn failing() -> Self {
        Self {
            healthy: false,
            failing: true,
            canned: None,
        }
    }

    /// Create a mock backend that always returns the given text
    pub fn with_response(text: &str) -> Self {
        Self {
            healthy: true,
            failing: false,
            canned: Some(text.to_string()),
        }
    }

    /// Create a new instance with a different model (no-op for mock)
    pub fn with_model(&self, _model: &str) -> Self {
        self.clone()
    }
}

#[async_trait]
impl InsightBackend for MockBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if self.failing {
            return Err(Error::Insight("mock backend set to fail".to_string()));
        }
        if let Some(ref canned) = self.canned {
            return Ok(canned.clone());
        }

        // Rough prompt-shape matching so tests read naturally
        let text = if prompt.contains("marketing strategist") {
            "Reallocate budget toward the strongest platform and refresh underperforming creatives weekly."
        } else if prompt.contains("forecast") {
            "ROI should land between 40% and 55% next month; consolidate spend on the top channel."
        } else if prompt.contains("marketing analyst") {
            "This client's campaigns are trending upward; propose a budget increase for the best platform."
        } else {
            "Mock analysis of the provided marketing data."
        };
        Ok(text.to_string())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
