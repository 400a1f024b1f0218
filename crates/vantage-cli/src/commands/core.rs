//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `resolve_db_path` - Resolve the database location from flags and config
//! - `open_db` - Shared utility to open the database
//! - `cli_viewer` - The identity CLI commands act as
//! - `cmd_init` - Initialize the database

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use vantage_core::models::Viewer;
use vantage_core::{Config, Database};

/// Database location: `--db` flag wins, then the config file, then the
/// working directory default.
pub fn resolve_db_path(flag: Option<&Path>, config: &Config) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| config.store.path.clone())
        .unwrap_or_else(|| PathBuf::from("vantage.db"))
}

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// CLI commands run with the full roster visible and audit as "cli"
pub fn cli_viewer() -> Viewer {
    Viewer::admin("cli")
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let _db = open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add a client: vantage clients add \"Acme Corp\" --email hello@acme.com");
    println!("  2. Import campaigns: vantage import --file export.csv --client 1");
    println!("  3. Start web UI: vantage serve");

    Ok(())
}
