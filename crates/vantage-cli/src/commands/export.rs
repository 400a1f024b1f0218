//! Data export command implementations

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use vantage_core::db::Database;
use vantage_core::export::{CampaignExportOptions, ExportFormat};
use vantage_core::models::CampaignStatus;

use super::cli_viewer;

/// Export campaigns to CSV or JSON
pub fn cmd_export_campaigns(
    db: &Database,
    output: Option<PathBuf>,
    client: Option<i64>,
    status: Option<&str>,
    format: &str,
) -> Result<()> {
    let format: ExportFormat = format
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{} (valid formats: csv, json)", e))?;

    let status = status
        .map(|s| s.parse::<CampaignStatus>())
        .transpose()
        .map_err(|e: String| anyhow::anyhow!("{} (valid statuses: ongoing, completed)", e))?;

    let opts = CampaignExportOptions {
        client_id: client,
        status,
    };

    let (contents, count) = match format {
        ExportFormat::Csv => {
            let csv = db.export_campaigns_csv(&opts)?;
            let count = csv.lines().count().saturating_sub(1); // Subtract header
            (csv, count)
        }
        ExportFormat::Json => {
            let rows = db.export_campaigns(&opts)?;
            let json = serde_json::to_string_pretty(&rows)
                .context("Failed to serialize campaigns to JSON")?;
            (json, rows.len())
        }
    };

    write_export(&contents, count, "campaigns", output.as_deref())
}

/// Export the client roster to CSV or JSON
pub fn cmd_export_clients(db: &Database, output: Option<PathBuf>, format: &str) -> Result<()> {
    let format: ExportFormat = format
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{} (valid formats: csv, json)", e))?;

    let viewer = cli_viewer();

    let (contents, count) = match format {
        ExportFormat::Csv => {
            let csv = db.export_clients_csv(&viewer)?;
            let count = csv.lines().count().saturating_sub(1); // Subtract header
            (csv, count)
        }
        ExportFormat::Json => {
            let rows = db.export_clients(&viewer)?;
            let json = serde_json::to_string_pretty(&rows)
                .context("Failed to serialize clients to JSON")?;
            (json, rows.len())
        }
    };

    write_export(&contents, count, "clients", output.as_deref())
}

fn write_export(contents: &str, count: usize, noun: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            file.write_all(contents.as_bytes())?;

            println!("✅ Exported {} {} to {}", count, noun, path.display());
        }
        None => {
            // Write to stdout; CSV output already carries a trailing newline
            if contents.ends_with('\n') {
                print!("{}", contents);
            } else {
                println!("{}", contents);
            }
        }
    }

    Ok(())
}
