//! Status and dashboard command implementations

use std::path::Path;

use anyhow::Result;
use vantage_core::metrics;

use super::{cli_viewer, open_db};

pub fn cmd_status(db_path: &Path, no_encrypt: bool) -> Result<()> {
    use std::fs;
    use vantage_core::db::DB_KEY_ENV;

    println!();
    println!("📊 Vantage Status");
    println!("   ─────────────────────────────────────────────────────────────");

    // Database path
    println!("   Database: {}", db_path.display());

    // Check if database file exists and get size
    if db_path.exists() {
        if let Ok(metadata) = fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    // Check encryption status
    let has_key = std::env::var(DB_KEY_ENV).is_ok();
    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else if has_key {
        println!("   🔒 Encryption: ENABLED ({}=***)", DB_KEY_ENV);
    } else {
        println!("   ❌ Encryption: REQUIRED but {} not set", DB_KEY_ENV);
    }

    // Try to open the database and show counts
    if db_path.exists() {
        match open_db(db_path, no_encrypt) {
            Ok(db) => {
                let viewer = cli_viewer();
                let clients = db.count_clients(&viewer).unwrap_or(0);
                let campaigns = db.count_campaigns().unwrap_or(0);
                let audit_entries = db.count_audit_log().unwrap_or(0);

                println!();
                println!("   Clients: {}", clients);
                println!("   Campaigns: {}", campaigns);
                println!("   Audit entries: {}", audit_entries);
            }
            Err(e) => {
                println!();
                println!("   ❌ Error opening database: {}", e);
                if !no_encrypt && !has_key {
                    println!("      Set {} or use --no-encrypt", DB_KEY_ENV);
                } else if has_key {
                    println!("      (Check if {} is correct)", DB_KEY_ENV);
                }
            }
        }
    }

    println!();
    Ok(())
}

pub fn cmd_dashboard(db_path: &Path, no_encrypt: bool) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;
    let viewer = cli_viewer();

    let campaigns = db.list_all_campaigns()?;
    let clients = db.list_clients(&viewer)?;
    let snapshot = metrics::aggregate(&campaigns, &clients);

    println!();
    println!("╭─────────────────────────────────────────╮");
    println!("│          📈 Vantage Dashboard           │");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Campaigns:       {}", snapshot.total_campaigns);
    println!("  Active:          {}", snapshot.active_campaigns);
    println!("  Total Budget:    ${:.2}", snapshot.total_budget);
    println!("  Total Revenue:   ${:.2}", snapshot.total_revenue);
    println!("  Average ROI:     {:.2}%", snapshot.average_roi);
    println!();

    if !snapshot.platform_rollups.is_empty() {
        println!("  📊 By Platform");
        for rollup in &snapshot.platform_rollups {
            println!(
                "     {:12} budget ${:.2}, revenue ${:.2}",
                rollup.platform, rollup.budget, rollup.revenue
            );
        }
        println!();
    }

    if !snapshot.top_clients.is_empty() {
        println!("  🏆 Top Clients");
        for client in &snapshot.top_clients {
            println!(
                "     {} (avg ROI {:.2}%)",
                client.client.name, client.average_roi
            );
        }
        println!();
    }

    if snapshot.total_campaigns > 0 {
        println!("  {}", snapshot.trends.summary.replace('\n', "\n  "));
        println!();
    }

    Ok(())
}
