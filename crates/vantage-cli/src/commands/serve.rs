//! Server command implementation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use vantage_core::insight::InsightBackend;
use vantage_core::{Config, InsightClient};

use super::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    config: &Config,
    host: Option<&str>,
    port: Option<u16>,
    no_auth: bool,
    no_encrypt: bool,
    static_dir: Option<&Path>,
) -> Result<()> {
    let (bind_host, bind_port) = resolve_bind(&config.server.bind, host, port);
    let static_dir: Option<PathBuf> = static_dir
        .map(Path::to_path_buf)
        .or_else(|| config.server.static_dir.clone());

    println!("🚀 Starting Vantage web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", bind_host, bind_port);
    if let Some(ref dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }

    // A bearer key grants non-interactive API access; env wins over file
    let api_key = std::env::var("VANTAGE_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| config.server.api_key.clone());

    let require_auth = !no_auth && config.server.require_auth;

    if !require_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else {
        println!("   🔒 Authentication: identity header (X-Vantage-User)");
        if !config.server.admin_emails.is_empty() {
            println!(
                "   👑 Admins: {} configured",
                config.server.admin_emails.len()
            );
        }
        if api_key.is_some() {
            println!("   🔑 API key: configured");
        }
    }

    let insight = InsightClient::from_config(&config.insight);
    match &insight {
        Some(client) => println!(
            "   🤖 Insight backend: {} (model: {})",
            config.insight.backend,
            client.model()
        ),
        None => println!("   💡 Tip: Set GEMINI_API_KEY to enable AI insights"),
    }

    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path, no_encrypt)?;

    let server_config = vantage_server::ServerConfig {
        require_auth,
        admin_emails: config.server.admin_emails.clone(),
        api_key,
        allowed_origins: vec![],
    };

    let static_dir_str = match &static_dir {
        Some(p) => Some(
            p.to_str()
                .context("static_dir path must be valid UTF-8")?,
        ),
        None => None,
    };

    vantage_server::serve_with_config(
        db,
        &bind_host,
        bind_port,
        static_dir_str,
        server_config,
        insight,
        config.backup.dir.clone(),
    )
    .await?;

    Ok(())
}

/// Merge `--host`/`--port` flags onto the config bind address
pub(crate) fn resolve_bind(bind: &str, host: Option<&str>, port: Option<u16>) -> (String, u16) {
    let (config_host, config_port) = match bind.rsplit_once(':') {
        Some((h, p)) => (h.to_string(), p.parse().unwrap_or(3000)),
        None => (bind.to_string(), 3000),
    };

    (
        host.map(str::to_string).unwrap_or(config_host),
        port.unwrap_or(config_port),
    )
}
