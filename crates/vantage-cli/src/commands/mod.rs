//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `backup` - Backup management commands (create, list, restore, prune)
//! - `campaigns` - Campaign commands (list, add, complete, rm)
//! - `clients` - Client roster commands (list, add, update, rm)
//! - `core` - Core commands (init) and shared utilities (open_db)
//! - `export` - CSV/JSON export commands
//! - `import` - Ad platform CSV import command
//! - `insight` - Gemini insight commands
//! - `prompts` - Prompt library management commands
//! - `report` - Client report export command
//! - `serve` - Web server command
//! - `status` - Status and dashboard commands

pub mod backup;
pub mod campaigns;
pub mod clients;
pub mod core;
pub mod export;
pub mod import;
pub mod insight;
pub mod prompts;
pub mod report;
pub mod serve;
pub mod status;

// Re-export command functions for main.rs
pub use backup::*;
pub use campaigns::*;
pub use clients::*;
pub use core::*;
pub use export::*;
pub use import::*;
pub use insight::*;
pub use prompts::*;
pub use report::*;
pub use serve::*;
pub use status::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}
