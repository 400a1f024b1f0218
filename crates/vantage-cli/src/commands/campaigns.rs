//! Campaign command implementations

use anyhow::{Context, Result};
use chrono::NaiveDate;
use vantage_core::models::{CampaignStatus, NewCampaign};
use vantage_core::{roi, Database};

use super::{cli_viewer, truncate};

/// List all campaigns with their client names
pub fn cmd_campaigns_list(db: &Database) -> Result<()> {
    let campaigns = db.list_campaigns()?;

    if campaigns.is_empty() {
        println!("No campaigns found. Add one with:");
        println!("  vantage campaigns add \"Spring Sale\" --client 1 --budget 1000");
        return Ok(());
    }

    println!();
    println!("📣 Campaigns");
    println!("   ─────────────────────────────────────────────────────────────────────");
    println!(
        "   {:>4} │ {:20} │ {:16} │ {:8} │ {:9} │ {:>8}",
        "ID", "Name", "Client", "Platform", "Status", "ROI"
    );
    println!("   ─────┼──────────────────────┼──────────────────┼──────────┼───────────┼─────────");

    for c in campaigns {
        let platform = c.platform.as_deref().unwrap_or("-");
        let campaign_roi = roi::roi(c.budget, c.revenue);
        println!(
            "   {:>4} │ {:20} │ {:16} │ {:8} │ {:9} │ {:>7.2}%",
            c.id,
            truncate(&c.name, 20),
            truncate(&c.client_name, 16),
            truncate(platform, 8),
            c.status.as_str(),
            campaign_roi
        );
    }

    Ok(())
}

/// Add a new campaign
pub fn cmd_campaigns_add(
    db: &Database,
    name: &str,
    client_id: i64,
    platform: Option<&str>,
    budget: f64,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<()> {
    let start_date = match start {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .context("Invalid --start date format (use YYYY-MM-DD)")?,
        None => chrono::Local::now().date_naive(),
    };
    let end_date = end
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("Invalid --end date format (use YYYY-MM-DD)")?;

    // The CLI verifies visibility up front for a friendlier error
    db.get_client(&cli_viewer(), client_id)?
        .ok_or_else(|| anyhow::anyhow!("Client not found: {}", client_id))?;

    let new = NewCampaign {
        name: name.to_string(),
        platform: platform.map(String::from),
        budget,
        revenue: None,
        status: CampaignStatus::Ongoing,
        start_date,
        end_date,
        client_id,
    };

    let campaign = db.create_campaign(&new)?;
    db.log_audit(
        "cli",
        "create",
        Some("campaign"),
        Some(campaign.id),
        Some(&format!(
            "name={}, client_id={}, budget={}",
            campaign.name, campaign.client_id, campaign.budget
        )),
    )?;

    println!(
        "✅ Created campaign '{}' (id: {}, budget: ${:.2})",
        campaign.name, campaign.id, campaign.budget
    );

    Ok(())
}

/// Complete a campaign with its final revenue
pub fn cmd_campaigns_complete(db: &Database, id: i64, revenue: f64) -> Result<()> {
    let campaign = db.complete_campaign(id, revenue)?;
    db.log_audit(
        "cli",
        "complete",
        Some("campaign"),
        Some(id),
        Some(&format!("revenue={}", revenue)),
    )?;

    println!(
        "✅ Completed campaign '{}' (revenue: ${:.2}, ROI: {:.2}%)",
        campaign.name,
        revenue,
        roi::campaign_roi(&campaign)
    );

    Ok(())
}

/// Delete a campaign
pub fn cmd_campaigns_rm(db: &Database, id: i64) -> Result<()> {
    let campaign = db
        .get_campaign(id)?
        .ok_or_else(|| anyhow::anyhow!("Campaign not found: {}", id))?;

    db.delete_campaign(id)?;
    db.log_audit(
        "cli",
        "delete",
        Some("campaign"),
        Some(id),
        Some(&format!("name={}", campaign.name)),
    )?;

    println!("✅ Deleted campaign '{}' (id: {})", campaign.name, id);

    Ok(())
}
