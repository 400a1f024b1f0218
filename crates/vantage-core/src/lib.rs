//! Vantage Core Library
//!
//! Shared functionality for the Vantage agency dashboard:
//! - Database access and migrations (encrypted client/campaign store)
//! - ROI math and dashboard metrics derivation
//! - CSV import parsers for ad platform exports
//! - Campaign and client roster export
//! - Gemini insight backend with graceful degradation
//! - Prompt library for customizable insight prompts
//! - Client report composition, pagination, and print-package export
//! - Backup system with pluggable destinations

pub mod backup;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod import;
pub mod insight;
pub mod metrics;
pub mod models;
pub mod prompts;
pub mod report;
pub mod roi;

/// Test utilities including mock Gemini server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use backup::{
    BackupDestination, BackupInfo, BackupResult, LocalDestination, PruneResult, RetentionPolicy,
};
pub use config::{BackupSettings, Config, InsightSettings, ServerSettings, StoreSettings};
pub use db::Database;
pub use error::{Error, Result};
pub use export::{CampaignExport, CampaignExportOptions, ClientExport, ExportFormat};
pub use import::{ImportFormat, ImportStats};
pub use insight::{GeminiBackend, InsightBackend, InsightClient, MockBackend};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use report::{
    ClientReport, DataUrlSurface, PagePlan, PageSpec, PrintPackage, RenderSurface, ReportDocument,
    ReportSnapshot,
};
