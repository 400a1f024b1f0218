//! Ad platform CSV import command

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use vantage_core::import::{detect_format, import_hash, parse_csv, ImportFormat};

use super::{cli_viewer, open_db};

pub fn cmd_import(
    db_path: &Path,
    file: &Path,
    client_id: i64,
    format_str: Option<&str>,
    no_encrypt: bool,
) -> Result<()> {
    // Open file and read first line for auto-detection
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let mut buf_reader = BufReader::new(csv_file);

    let mut header_line = String::new();
    buf_reader
        .read_line(&mut header_line)
        .context("Failed to read CSV header")?;

    // Determine spreadsheet format
    let format: ImportFormat = if let Some(format_str) = format_str {
        format_str
            .parse()
            .map_err(|e: String| anyhow::anyhow!("{} (valid formats: meta, google)", e))?
    } else {
        detect_format(&header_line).ok_or_else(|| {
            anyhow::anyhow!(
                "Could not auto-detect the spreadsheet format from the CSV header.\n\
                 Specify --format with one of: meta, google"
            )
        })?
    };

    println!(
        "📥 Importing {} campaigns from {}...",
        format.platform_label(),
        file.display()
    );

    let db = open_db(db_path, no_encrypt)?;

    // The client must exist before any rows land
    let client = db
        .get_client(&cli_viewer(), client_id)?
        .ok_or_else(|| anyhow::anyhow!("Client not found: {}", client_id))?;
    println!("   Client: {} (id: {})", client.name, client.id);

    // Re-open file to parse from the beginning (including header)
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let campaigns = parse_csv(csv_file, format, client_id)?;

    println!("   Found {} campaigns", campaigns.len());

    let mut imported = 0;
    let mut skipped = 0;

    for campaign in &campaigns {
        let hash = import_hash(client_id, &campaign.name, &campaign.start_date);
        match db.insert_imported_campaign(campaign, &hash)? {
            Some(_) => imported += 1,
            None => skipped += 1,
        }
    }

    db.log_audit(
        "cli",
        "import",
        Some("campaign"),
        None,
        Some(&format!(
            "client_id={}, format={}, imported={}, skipped={}",
            client_id,
            format.as_str(),
            imported,
            skipped
        )),
    )?;

    println!("✅ Import complete!");
    println!("   Imported: {}", imported);
    println!("   Skipped (duplicates): {}", skipped);

    if imported > 0 {
        println!();
        println!("Run 'vantage dashboard' to see the updated metrics.");
    }

    Ok(())
}
