//! Client roster command implementations

use std::io::{self, Write};

use anyhow::Result;
use vantage_core::models::{MembershipTier, NewClient, UpdateClient};
use vantage_core::Database;

use super::{cli_viewer, truncate};

/// List all clients
pub fn cmd_clients_list(db: &Database) -> Result<()> {
    let clients = db.list_clients(&cli_viewer())?;

    if clients.is_empty() {
        println!("No clients found. Add one with:");
        println!("  vantage clients add \"Acme Corp\" --email hello@acme.com");
        return Ok(());
    }

    println!();
    println!("👥 Clients");
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:>4} │ {:20} │ {:24} │ {:8} │ {}",
        "ID", "Name", "Email", "Tier", "Status"
    );
    println!("   ─────┼──────────────────────┼──────────────────────────┼──────────┼─────────");

    for client in clients {
        let status = if client.is_active { "active" } else { "inactive" };
        println!(
            "   {:>4} │ {:20} │ {:24} │ {:8} │ {}",
            client.id,
            truncate(&client.name, 20),
            truncate(&client.email, 24),
            client.membership.as_str(),
            status
        );
    }

    Ok(())
}

/// Add a new client
pub fn cmd_clients_add(
    db: &Database,
    name: &str,
    email: &str,
    phone: Option<&str>,
    company: Option<&str>,
    membership: &str,
) -> Result<()> {
    let tier: MembershipTier = membership.parse().map_err(|e: String| {
        anyhow::anyhow!("{} (valid tiers: silver, gold, diamond)", e)
    })?;

    let new = NewClient {
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.map(String::from),
        company: company.map(String::from),
        membership: tier,
        is_active: true,
    };

    let client = db.create_client(&cli_viewer(), &new)?;
    db.log_audit(
        "cli",
        "create",
        Some("client"),
        Some(client.id),
        Some(&format!("name={}, email={}", client.name, client.email)),
    )?;

    println!(
        "✅ Created client '{}' ({}) (id: {})",
        client.name,
        client.membership.as_str(),
        client.id
    );

    Ok(())
}

/// Update a client; absent flags keep their current value
#[allow(clippy::too_many_arguments)]
pub fn cmd_clients_update(
    db: &Database,
    id: i64,
    name: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
    company: Option<&str>,
    membership: Option<&str>,
    active: Option<bool>,
) -> Result<()> {
    let tier: Option<MembershipTier> = membership
        .map(|m| {
            m.parse().map_err(|e: String| {
                anyhow::anyhow!("{} (valid tiers: silver, gold, diamond)", e)
            })
        })
        .transpose()?;

    let changes = UpdateClient {
        name: name.map(String::from),
        email: email.map(String::from),
        phone: phone.map(String::from),
        company: company.map(String::from),
        membership: tier,
        is_active: active,
    };

    let client = db.update_client(&cli_viewer(), id, &changes)?;
    db.log_audit(
        "cli",
        "update",
        Some("client"),
        Some(id),
        Some(&format!("name={}, email={}", client.name, client.email)),
    )?;

    println!("✅ Updated client '{}' (id: {})", client.name, id);

    Ok(())
}

/// Delete a client and all of its campaigns
pub fn cmd_clients_rm(db: &Database, id: i64, yes: bool) -> Result<()> {
    let viewer = cli_viewer();
    let client = db
        .get_client(&viewer, id)?
        .ok_or_else(|| anyhow::anyhow!("Client not found: {}", id))?;

    let campaigns = db.list_campaigns_for_client(id)?;

    if !yes {
        println!(
            "⚠️  This will delete client '{}' and {} campaign(s).",
            client.name,
            campaigns.len()
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

    db.delete_client(&viewer, id)?;
    db.log_audit(
        "cli",
        "delete",
        Some("client"),
        Some(id),
        Some(&format!("name={}", client.name)),
    )?;

    println!(
        "✅ Deleted client '{}' and {} campaign(s)",
        client.name,
        campaigns.len()
    );

    Ok(())
}
