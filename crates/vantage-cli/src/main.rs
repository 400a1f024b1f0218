//! Vantage CLI - Marketing agency dashboard
//!
//! Usage:
//!   vantage init                    Initialize database
//!   vantage import --file CSV --client 1
//!                                   Import campaigns (auto-detects ad platform)
//!   vantage dashboard               Show campaign metrics
//!   vantage serve --port 3000       Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vantage_core::Config;

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = Config::load(cli.config.as_deref())?;
    let db_path = commands::resolve_db_path(cli.db.as_deref(), &config);
    let no_encrypt = cli.no_encrypt || !config.store.encrypt;

    match cli.command {
        Commands::Init => commands::cmd_init(&db_path, no_encrypt),
        Commands::Serve {
            port,
            host,
            no_auth,
            static_dir,
        } => {
            commands::cmd_serve(
                &db_path,
                &config,
                host.as_deref(),
                port,
                no_auth,
                no_encrypt,
                static_dir.as_deref(),
            )
            .await
        }
        Commands::Status => commands::cmd_status(&db_path, no_encrypt),
        Commands::Dashboard => commands::cmd_dashboard(&db_path, no_encrypt),
        Commands::Clients { action } => {
            let db = commands::open_db(&db_path, no_encrypt)?;
            match action {
                None | Some(ClientsAction::List) => commands::cmd_clients_list(&db),
                Some(ClientsAction::Add {
                    name,
                    email,
                    phone,
                    company,
                    membership,
                }) => commands::cmd_clients_add(
                    &db,
                    &name,
                    &email,
                    phone.as_deref(),
                    company.as_deref(),
                    &membership,
                ),
                Some(ClientsAction::Update {
                    id,
                    name,
                    email,
                    phone,
                    company,
                    membership,
                    active,
                }) => commands::cmd_clients_update(
                    &db,
                    id,
                    name.as_deref(),
                    email.as_deref(),
                    phone.as_deref(),
                    company.as_deref(),
                    membership.as_deref(),
                    active,
                ),
                Some(ClientsAction::Rm { id, yes }) => commands::cmd_clients_rm(&db, id, yes),
            }
        }
        Commands::Campaigns { action } => {
            let db = commands::open_db(&db_path, no_encrypt)?;
            match action {
                None | Some(CampaignsAction::List) => commands::cmd_campaigns_list(&db),
                Some(CampaignsAction::Add {
                    name,
                    client,
                    platform,
                    budget,
                    start,
                    end,
                }) => commands::cmd_campaigns_add(
                    &db,
                    &name,
                    client,
                    platform.as_deref(),
                    budget,
                    start.as_deref(),
                    end.as_deref(),
                ),
                Some(CampaignsAction::Complete { id, revenue }) => {
                    commands::cmd_campaigns_complete(&db, id, revenue)
                }
                Some(CampaignsAction::Rm { id }) => commands::cmd_campaigns_rm(&db, id),
            }
        }
        Commands::Import {
            file,
            client,
            format,
        } => commands::cmd_import(&db_path, &file, client, format.as_deref(), no_encrypt),
        Commands::Export { export_type } => {
            let db = commands::open_db(&db_path, no_encrypt)?;
            match export_type {
                ExportType::Campaigns {
                    output,
                    client,
                    status,
                    format,
                } => commands::cmd_export_campaigns(&db, output, client, status.as_deref(), &format),
                ExportType::Clients { output, format } => {
                    commands::cmd_export_clients(&db, output, &format)
                }
            }
        }
        Commands::Insight { forecast, client } => {
            commands::cmd_insight(&db_path, &config, forecast, client, no_encrypt).await
        }
        Commands::Report {
            client_id,
            capture,
            out,
            insight,
        } => {
            commands::cmd_report(&db_path, &config, client_id, &capture, out, insight, no_encrypt)
                .await
        }
        Commands::Backup { action } => match action {
            BackupAction::Create { name, dir } => {
                let db = commands::open_db(&db_path, no_encrypt)?;
                commands::cmd_backup_create(&db, name.as_deref(), dir, &config)
            }
            BackupAction::List { dir } => commands::cmd_backup_list(dir, &config),
            BackupAction::Restore { name, dir, force } => {
                commands::cmd_backup_restore(&db_path, &name, dir, force, no_encrypt, &config)
            }
            BackupAction::Prune { keep, dir, yes } => {
                commands::cmd_backup_prune(keep, dir, yes, &config)
            }
        },
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { prompt_id }) => commands::cmd_prompts_show(&prompt_id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
    }
}
