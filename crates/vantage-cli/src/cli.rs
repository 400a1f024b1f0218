//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Vantage - Campaign metrics and reporting for marketing agencies
#[derive(Parser)]
#[command(name = "vantage")]
#[command(about = "Self-hosted marketing agency dashboard", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (overrides the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file path (default: vantage.toml, then the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set VANTAGE_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, the server requires an identity header or API key.
        #[arg(long)]
        no_auth: bool,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Show database status (encryption, size, etc.)
    Status,

    /// Show dashboard summary
    Dashboard,

    /// Manage clients (list, add, update, rm)
    Clients {
        #[command(subcommand)]
        action: Option<ClientsAction>,
    },

    /// Manage campaigns (list, add, complete, rm)
    Campaigns {
        #[command(subcommand)]
        action: Option<CampaignsAction>,
    },

    /// Import campaigns from an ad platform CSV export
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Client the campaigns belong to
        #[arg(short, long)]
        client: i64,

        /// Spreadsheet format: meta or google (auto-detected if not specified)
        #[arg(long)]
        format: Option<String>,
    },

    /// Export campaigns or clients
    Export {
        #[command(subcommand)]
        export_type: ExportType,
    },

    /// Request an AI insight for the dashboard or a client
    Insight {
        /// Forecast next month's ROI instead of summarizing the dashboard
        #[arg(long)]
        forecast: bool,

        /// Analyze one client instead of the whole dashboard
        #[arg(long)]
        client: Option<i64>,
    },

    /// Export a client report document from a dashboard capture
    Report {
        /// Client to report on
        client_id: i64,

        /// PNG capture of the rendered report region
        #[arg(long)]
        capture: PathBuf,

        /// Output directory (default: reports)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Include an AI insight in the report
        #[arg(long)]
        insight: bool,
    },

    /// Manage database backups (create, list, restore, prune)
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Manage AI prompts (list available prompts, view override status)
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },
}

#[derive(Subcommand)]
pub enum ClientsAction {
    /// List clients
    List,

    /// Add a new client
    Add {
        /// Client name
        name: String,

        /// Contact email
        #[arg(short, long)]
        email: String,

        /// Contact phone
        #[arg(long)]
        phone: Option<String>,

        /// Company name
        #[arg(long)]
        company: Option<String>,

        /// Membership tier: silver, gold, diamond
        #[arg(long, default_value = "silver")]
        membership: String,
    },

    /// Update a client
    Update {
        /// Client ID
        id: i64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New contact email
        #[arg(long)]
        email: Option<String>,

        /// New contact phone
        #[arg(long)]
        phone: Option<String>,

        /// New company name
        #[arg(long)]
        company: Option<String>,

        /// New membership tier: silver, gold, diamond
        #[arg(long)]
        membership: Option<String>,

        /// Mark the client active or inactive
        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete a client and all of its campaigns
    Rm {
        /// Client ID
        id: i64,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum CampaignsAction {
    /// List campaigns
    List,

    /// Add a new campaign
    Add {
        /// Campaign name
        name: String,

        /// Client the campaign belongs to
        #[arg(short, long)]
        client: i64,

        /// Ad platform (e.g., Meta, Google)
        #[arg(long)]
        platform: Option<String>,

        /// Budget in dollars
        #[arg(long, default_value = "0")]
        budget: f64,

        /// Start date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },

    /// Complete a campaign with its final revenue
    Complete {
        /// Campaign ID
        id: i64,

        /// Final revenue in dollars
        #[arg(long)]
        revenue: f64,
    },

    /// Delete a campaign
    Rm {
        /// Campaign ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ExportType {
    /// Export campaigns to CSV or JSON
    Campaigns {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Restrict to one client
        #[arg(long)]
        client: Option<i64>,

        /// Restrict to one status: ongoing or completed
        #[arg(long)]
        status: Option<String>,

        /// Output format: csv or json
        #[arg(long, default_value = "csv")]
        format: String,
    },

    /// Export clients to CSV or JSON
    Clients {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: csv or json
        #[arg(long, default_value = "csv")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum BackupAction {
    /// Create a new backup
    Create {
        /// Custom backup name (defaults to a timestamped name)
        #[arg(long)]
        name: Option<String>,

        /// Backup directory (defaults to the config file, then the data dir)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// List available backups
    List {
        /// Backup directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Restore a backup over the current database
    Restore {
        /// Backup name to restore
        name: String,

        /// Backup directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Overwrite an existing database without asking
        #[arg(long)]
        force: bool,
    },

    /// Prune old backups according to the retention policy
    Prune {
        /// Number of backups to keep (defaults to the config file, then 7)
        #[arg(long)]
        keep: Option<usize>,

        /// Backup directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all prompts and their override status
    List,

    /// Show the content of a specific prompt
    Show {
        /// Prompt ID (e.g., dashboard_insight)
        prompt_id: String,
    },

    /// Show the path where prompt overrides should be placed
    Path,
}
