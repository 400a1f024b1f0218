//! AI insight command implementation

use std::path::Path;

use anyhow::Result;
use vantage_core::insight::InsightBackend;
use vantage_core::prompts::{client_insight_prompt, dashboard_insight_prompt, roi_forecast_prompt};
use vantage_core::{metrics, Config, InsightClient, PromptLibrary};

use super::{cli_viewer, open_db};

/// Generate insight text for the dashboard, an ROI forecast, or one client
pub async fn cmd_insight(
    db_path: &Path,
    config: &Config,
    forecast: bool,
    client_id: Option<i64>,
    no_encrypt: bool,
) -> Result<()> {
    let insight_client = InsightClient::from_config(&config.insight).ok_or_else(|| {
        anyhow::anyhow!(
            "Insight backend not configured. Set GEMINI_API_KEY, \
             or set backend = \"mock\" under [insight] in the config file."
        )
    })?;

    let db = open_db(db_path, no_encrypt)?;
    let viewer = cli_viewer();
    let mut prompt_lib = PromptLibrary::new();

    let (label, prompt) = if let Some(id) = client_id {
        let client = db
            .get_client(&viewer, id)?
            .ok_or_else(|| anyhow::anyhow!("Client not found: {}", id))?;
        let campaigns = db.list_campaigns_for_client(id)?;
        let stats = metrics::client_metrics(&client, &campaigns);
        (
            format!("insight for {}", client.name),
            client_insight_prompt(&mut prompt_lib, &stats)?,
        )
    } else {
        let campaigns = db.list_all_campaigns()?;
        let clients = db.list_clients(&viewer)?;
        let snapshot = metrics::aggregate(&campaigns, &clients);

        if forecast {
            (
                "ROI forecast".to_string(),
                roi_forecast_prompt(&mut prompt_lib, &snapshot)?,
            )
        } else {
            (
                "dashboard insight".to_string(),
                dashboard_insight_prompt(&mut prompt_lib, &snapshot)?,
            )
        }
    };

    println!("✨ Generating {}...", label);
    println!("   Model: {}", insight_client.model());
    println!();

    let text = insight_client.request_insight(&prompt).await;
    println!("{}", text);

    Ok(())
}
