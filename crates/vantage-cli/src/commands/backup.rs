//! Backup management commands

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use vantage_core::backup::{default_backup_dir, LocalDestination, RetentionPolicy};
use vantage_core::{Config, Database};

use super::{cli_viewer, open_db};

/// Resolve the backup directory: flag > config > platform data dir
fn resolve_backup_dir(dir: Option<PathBuf>, config: &Config) -> PathBuf {
    dir.or_else(|| config.backup.dir.clone())
        .unwrap_or_else(default_backup_dir)
}

/// Create a new backup
pub fn cmd_backup_create(
    db: &Database,
    name: Option<&str>,
    dir: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    let backup_dir = resolve_backup_dir(dir, config);
    let destination = LocalDestination::new(&backup_dir).with_context(|| {
        format!(
            "Failed to initialize backup directory: {}",
            backup_dir.display()
        )
    })?;

    println!("Creating backup...");

    let result = db
        .create_backup(&destination, name)
        .context("Failed to create backup")?;

    db.log_audit(
        "cli",
        "backup_created",
        Some("backup"),
        None,
        Some(&format!("name={}", result.info.name)),
    )?;

    println!("✅ Backup created: {}", result.info.name);
    println!("   Location: {}", result.info.path);
    println!("   Size: {}", format_size(result.info.size));
    println!("   Clients: {}", result.clients);
    println!("   Campaigns: {}", result.campaigns);
    if db.is_encrypted().unwrap_or(false) {
        println!("   🔒 Encrypted (same key required to restore)");
    }
    if result.info.compressed {
        println!("   📦 Compressed");
    }

    Ok(())
}

/// List available backups
pub fn cmd_backup_list(dir: Option<PathBuf>, config: &Config) -> Result<()> {
    let backup_dir = resolve_backup_dir(dir, config);

    if !backup_dir.exists() {
        println!("No backups found (backup directory does not exist)");
        println!("Directory: {}", backup_dir.display());
        return Ok(());
    }

    let destination = LocalDestination::new(&backup_dir).with_context(|| {
        format!(
            "Failed to access backup directory: {}",
            backup_dir.display()
        )
    })?;

    let backups = Database::list_backups(&destination).context("Failed to list backups")?;

    if backups.is_empty() {
        println!("No backups found");
        println!("Directory: {}", backup_dir.display());
        return Ok(());
    }

    println!("Available backups ({}):", backup_dir.display());
    println!();
    println!("{:<35} {:>12} {:>10}", "NAME", "SIZE", "CREATED");
    println!("{}", "-".repeat(60));

    for backup in backups {
        let created = backup.created_at.format("%Y-%m-%d %H:%M");
        let size = format_size(backup.size);
        let flags = if backup.compressed { "📦" } else { "" };

        println!("{:<35} {:>12} {:>10} {}", backup.name, size, created, flags);
    }

    Ok(())
}

/// Restore from a backup
pub fn cmd_backup_restore(
    db_path: &Path,
    name: &str,
    dir: Option<PathBuf>,
    force: bool,
    no_encrypt: bool,
    config: &Config,
) -> Result<()> {
    let backup_dir = resolve_backup_dir(dir, config);
    let destination = LocalDestination::new(&backup_dir).with_context(|| {
        format!(
            "Failed to access backup directory: {}",
            backup_dir.display()
        )
    })?;

    // Check if backup exists
    let backups = Database::list_backups(&destination)?;
    let backup = backups
        .iter()
        .find(|b| b.name == name)
        .ok_or_else(|| anyhow::anyhow!("Backup not found: {}", name))?;

    // Check if target exists
    if db_path.exists() && !force {
        anyhow::bail!(
            "Database already exists at {}.\nUse --force to overwrite.",
            db_path.display()
        );
    }

    if db_path.exists() {
        println!(
            "⚠️  This will overwrite the existing database at {}",
            db_path.display()
        );
        print!("Continue? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled");
            return Ok(());
        }
    }

    println!("Restoring from backup: {}", backup.name);

    Database::restore_backup(&destination, name, db_path, force)
        .context("Failed to restore backup")?;

    // Verify the restored database
    let restored_db = open_db(db_path, no_encrypt)?;
    let clients = restored_db.count_clients(&cli_viewer())?;
    let campaigns = restored_db.count_campaigns()?;

    println!("✅ Database restored from: {}", backup.name);
    println!("   Location: {}", db_path.display());
    println!("   Clients: {}", clients);
    println!("   Campaigns: {}", campaigns);

    Ok(())
}

/// Prune old backups according to retention policy
pub fn cmd_backup_prune(
    keep: Option<usize>,
    dir: Option<PathBuf>,
    yes: bool,
    config: &Config,
) -> Result<()> {
    let keep = keep.unwrap_or(config.backup.keep);
    let backup_dir = resolve_backup_dir(dir, config);
    let destination = LocalDestination::new(&backup_dir).with_context(|| {
        format!(
            "Failed to access backup directory: {}",
            backup_dir.display()
        )
    })?;

    let backups = Database::list_backups(&destination)?;

    if backups.len() <= keep {
        println!(
            "Nothing to prune. {} backup(s) found, keeping {}.",
            backups.len(),
            keep
        );
        return Ok(());
    }

    let to_delete = backups.len() - keep;

    if !yes {
        println!(
            "This will delete {} backup(s), keeping the {} most recent:",
            to_delete, keep
        );
        println!();
        for backup in backups.iter().skip(keep) {
            println!("  - {} ({})", backup.name, format_size(backup.size));
        }
        println!();
        print!("Continue? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled");
            return Ok(());
        }
    }

    let policy = RetentionPolicy::keep_last(keep);
    let result =
        Database::prune_backups(&destination, &policy).context("Failed to prune backups")?;

    println!("✅ Pruned {} backup(s)", result.deleted_count);
    println!("   Freed: {}", format_size(result.bytes_freed));
    println!("   Remaining: {} backup(s)", result.retained_count);

    if !result.deleted_names.is_empty() {
        println!();
        println!("Deleted:");
        for name in &result.deleted_names {
            println!("  - {}", name);
        }
    }

    Ok(())
}

/// Format a byte size as human-readable
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
