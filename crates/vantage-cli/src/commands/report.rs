//! Client report export command implementation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;
use sha2::{Digest, Sha256};
use vantage_core::prompts::client_insight_prompt;
use vantage_core::report::{compose_client_report, DataUrlSurface};
use vantage_core::{metrics, Config, InsightClient, PromptLibrary};

use super::{cli_viewer, open_db};

/// Compose a client report and export it as a paginated print package
pub async fn cmd_report(
    db_path: &Path,
    config: &Config,
    client_id: i64,
    capture: &Path,
    out: Option<PathBuf>,
    insight: bool,
    no_encrypt: bool,
) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;
    let viewer = cli_viewer();

    let client = db
        .get_client(&viewer, client_id)?
        .ok_or_else(|| anyhow::anyhow!("Client not found: {}", client_id))?;
    let campaigns = db.list_campaigns_for_client(client_id)?;

    println!("📄 Composing report for {}...", client.name);
    println!("   Campaigns: {}", campaigns.len());

    // Optional AI insight section; without it the report carries placeholder text
    let insight_text = if insight {
        match InsightClient::from_config(&config.insight) {
            Some(insight_client) => {
                let stats = metrics::client_metrics(&client, &campaigns);
                let mut prompt_lib = PromptLibrary::new();
                let prompt = client_insight_prompt(&mut prompt_lib, &stats)?;
                Some(insight_client.request_insight(&prompt).await)
            }
            None => {
                println!("   ⚠️  Insight backend not configured; using placeholder text");
                None
            }
        }
    } else {
        None
    };

    let report = compose_client_report(&client, &campaigns, insight_text);

    // Read the dashboard capture and compute its digest before handing it over
    let png = std::fs::read(capture)
        .with_context(|| format!("Failed to read capture: {}", capture.display()))?;
    let digest = hex::encode(Sha256::digest(&png));

    let data_url = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&png)
    );
    let surface = DataUrlSurface::new(data_url);

    let out_dir = out.unwrap_or_else(|| PathBuf::from("reports"));
    let document = vantage_core::report::export_client_report(&surface, &report, &out_dir)?;

    // The package records the digest of the capture it embeds; confirm it
    // matches the bytes we read
    if document.sha256 != digest {
        anyhow::bail!(
            "Capture digest mismatch in exported package: {}",
            document.path.display()
        );
    }

    db.log_audit(
        "cli",
        "export",
        Some("report"),
        Some(client_id),
        Some(&format!(
            "file={}, pages={}, bytes={}",
            document.file_name, document.pages, document.size
        )),
    )?;

    println!("✅ Report exported to {}", document.path.display());
    println!("   Pages: {}", document.pages);
    println!("   Size: {} bytes", document.size);
    println!("   SHA-256: {}", document.sha256);

    Ok(())
}
