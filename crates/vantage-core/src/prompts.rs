//! Prompt library for Gemini insight requests
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/vantage/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! This allows users to customize prompts without modifying the source,
//! while automatically getting new default prompts on upgrade.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{ClientMetrics, DashboardMetrics};
use crate::roi::campaign_roi;

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const DASHBOARD_INSIGHT: &str = include_str!("../../../prompts/dashboard_insight.md");
    pub const ROI_FORECAST: &str = include_str!("../../../prompts/roi_forecast.md");
    pub const CLIENT_INSIGHT: &str = include_str!("../../../prompts/client_insight.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    DashboardInsight,
    RoiForecast,
    ClientInsight,
}

impl PromptId {
    /// Get the string identifier for this prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DashboardInsight => "dashboard_insight",
            Self::RoiForecast => "roi_forecast",
            Self::ClientInsight => "client_insight",
        }
    }

    /// Get all known prompt IDs
    pub fn all() -> &'static [PromptId] {
        &[Self::DashboardInsight, Self::RoiForecast, Self::ClientInsight]
    }

    /// Get the default embedded content for this prompt
    fn default_content(&self) -> &'static str {
        match self {
            Self::DashboardInsight => defaults::DASHBOARD_INSIGHT,
            Self::RoiForecast => defaults::ROI_FORECAST,
            Self::ClientInsight => defaults::CLIENT_INSIGHT,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    /// Unique identifier
    pub id: String,
    /// Version number for tracking changes
    pub version: u32,
    /// One-line description for listings
    pub description: String,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Metadata from frontmatter
    pub metadata: PromptMetadata,
    /// The prompt template text
    pub content: String,
    /// Whether this came from an override file
    pub is_override: bool,
    /// Path to override file (if any)
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    /// Render the prompt with template variables replaced
    pub fn render(&self, vars: &HashMap<&str, String>) -> String {
        let mut result = self.content.clone();

        // Simple mustache-style replacement: {{var}}
        for (key, value) in vars {
            let pattern = format!("{{{{{}}}}}", key);
            result = result.replace(&pattern, value);
        }

        result
    }
}

/// Prompt library for loading and caching prompts
pub struct PromptLibrary {
    /// Override directory path
    override_dir: Option<PathBuf>,
    /// Cached parsed prompts
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a new prompt library with default paths
    pub fn new() -> Self {
        let override_dir = default_prompts_dir();
        Self {
            override_dir,
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with a custom override directory
    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt by ID, loading from override or default
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.cache.contains_key(&id) {
            let prompt = self.load(id)?;
            self.cache.insert(id, prompt);
        }
        Ok(self.cache.get(&id).unwrap())
    }

    /// Load a prompt (checking override first, then default)
    fn load(&self, id: PromptId) -> Result<Prompt> {
        // Check for override
        if let Some(ref override_dir) = self.override_dir {
            let override_path = override_dir.join(format!("{}.md", id.as_str()));
            if override_path.exists() {
                let content = fs::read_to_string(&override_path).map_err(|e| {
                    Error::InvalidData(format!("Failed to read prompt override: {}", e))
                })?;
                let (metadata, body) = parse_prompt(&content)?;
                return Ok(Prompt {
                    metadata,
                    content: body,
                    is_override: true,
                    override_path: Some(override_path),
                });
            }
        }

        // Use embedded default
        let content = id.default_content();
        let (metadata, body) = parse_prompt(content)?;
        Ok(Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        })
    }

    /// List all prompts with their override status
    pub fn list(&mut self) -> Vec<PromptInfo> {
        PromptId::all()
            .iter()
            .map(|&id| {
                let has_override = self.has_override(id);
                let prompt = self.get(id).ok();
                PromptInfo {
                    id: id.as_str().to_string(),
                    version: prompt.as_ref().map(|p| p.metadata.version).unwrap_or(0),
                    description: prompt
                        .map(|p| p.metadata.description.clone())
                        .unwrap_or_default(),
                    has_override,
                    override_path: if has_override {
                        self.override_dir
                            .as_ref()
                            .map(|d| d.join(format!("{}.md", id.as_str())))
                    } else {
                        None
                    },
                }
            })
            .collect()
    }

    /// Check if a prompt has an override file
    pub fn has_override(&self, id: PromptId) -> bool {
        if let Some(ref override_dir) = self.override_dir {
            override_dir.join(format!("{}.md", id.as_str())).exists()
        } else {
            false
        }
    }

    /// Get the override directory path
    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }

    /// Clear the cache (useful after editing override files)
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about a prompt for listing
#[derive(Debug, Clone)]
pub struct PromptInfo {
    /// Prompt identifier
    pub id: String,
    /// Version from metadata
    pub version: u32,
    /// Description from metadata
    pub description: String,
    /// Whether an override exists
    pub has_override: bool,
    /// Path to override file (if exists)
    pub override_path: Option<PathBuf>,
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("vantage").join("prompts").join("overrides"))
}

// ========== Prompt assembly ==========

/// Render the dashboard strategist prompt from an aggregated snapshot
///
/// Best/worst performer names come from the trend alerts; an unnamed or
/// absent campaign renders as "N/A".
pub fn dashboard_insight_prompt(
    lib: &mut PromptLibrary,
    metrics: &DashboardMetrics,
) -> Result<String> {
    let best = trend_name(metrics.trends.top_trending.first().map(|p| p.name.as_str()));
    let worst = trend_name(metrics.trends.declining.first().map(|p| p.name.as_str()));

    let mut vars: HashMap<&str, String> = HashMap::new();
    vars.insert("total_campaigns", metrics.total_campaigns.to_string());
    vars.insert("average_roi", format!("{:.2}", metrics.average_roi));
    vars.insert("best_campaign", best);
    vars.insert("worst_campaign", worst);

    Ok(lib.get(PromptId::DashboardInsight)?.render(&vars))
}

/// Render the next-month ROI forecast prompt
pub fn roi_forecast_prompt(lib: &mut PromptLibrary, metrics: &DashboardMetrics) -> Result<String> {
    let mut vars: HashMap<&str, String> = HashMap::new();
    vars.insert("average_roi", format!("{:.2}", metrics.average_roi));

    Ok(lib.get(PromptId::RoiForecast)?.render(&vars))
}

/// Render the client analyst prompt from one client's aggregates
pub fn client_insight_prompt(lib: &mut PromptLibrary, metrics: &ClientMetrics) -> Result<String> {
    let campaign_lines: Vec<String> = metrics
        .campaigns
        .iter()
        .map(|c| {
            let name = if c.name.is_empty() { "unnamed" } else { c.name.as_str() };
            let platform = c
                .platform
                .as_deref()
                .filter(|p| !p.is_empty())
                .unwrap_or("Unknown");
            format!(
                "- {} ({}): budget {}, revenue {}, ROI {:.2}%",
                name,
                platform,
                c.budget,
                c.effective_revenue(),
                campaign_roi(c)
            )
        })
        .collect();

    let mut vars: HashMap<&str, String> = HashMap::new();
    vars.insert("client_name", metrics.client.name.clone());
    vars.insert("client_email", metrics.client.email.clone());
    vars.insert("campaign_count", metrics.campaigns.len().to_string());
    vars.insert("average_roi", format!("{:.2}", metrics.average_roi));
    vars.insert("campaign_lines", campaign_lines.join("\n"));

    Ok(lib.get(PromptId::ClientInsight)?.render(&vars))
}

fn trend_name(name: Option<&str>) -> String {
    match name {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => "N/A".to_string(),
    }
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    // Check for YAML frontmatter
    if !content.starts_with("---") {
        return Err(Error::InvalidData(
            "Prompt must start with YAML frontmatter (---)".into(),
        ));
    }

    // Find end of frontmatter
    let rest = &content[3..];
    let end = rest.find("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = &rest[..end].trim();
    let body = &rest[end + 3..].trim();

    // Parse frontmatter as YAML
    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}
