//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod audit;
pub mod auth;
pub mod backup;
pub mod campaigns;
pub mod clients;
pub mod dashboard;
pub mod export;
pub mod import;
pub mod insights;
pub mod reports;

// Re-export all handlers for use in router
pub use audit::*;
pub use auth::*;
pub use backup::*;
pub use campaigns::*;
pub use clients::*;
pub use dashboard::*;
pub use export::*;
pub use import::*;
pub use insights::*;
pub use reports::*;
