//! Configuration loading for Vantage
//!
//! Settings come from a TOML file plus environment overrides. The file is
//! resolved from the first of: an explicit path (`--config`), `$VANTAGE_CONFIG`,
//! `./vantage.toml`, `{config_dir}/vantage/config.toml`. A missing file yields
//! defaults; a malformed file is a startup error. Environment variables always
//! win over file values.
//!
//! Secrets never live in the file: the store key is read from `VANTAGE_DB_KEY`
//! and the Gemini key from `GEMINI_API_KEY`, both at the point of use.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::insight::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Environment variable naming an alternate config file
pub const CONFIG_ENV: &str = "VANTAGE_CONFIG";

/// Resolved application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub store: StoreSettings,
    pub server: ServerSettings,
    pub insight: InsightSettings,
    pub backup: BackupSettings,
}

/// `[store]` section: where the database lives and whether it is encrypted
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    /// Database file path; None means the CLI/server default applies
    pub path: Option<PathBuf>,
    /// Encrypt the store with a key from `VANTAGE_DB_KEY`
    pub encrypt: bool,
}

/// `[server]` section
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    /// Bind address, e.g. `127.0.0.1:3000`
    pub bind: String,
    /// Emails granted the admin role
    pub admin_emails: Vec<String>,
    /// Require an identity on every request (only `/api/health` is exempt)
    pub require_auth: bool,
    /// Optional bearer key for non-interactive API access
    pub api_key: Option<String>,
    /// Optional directory of static frontend assets to serve
    pub static_dir: Option<PathBuf>,
}

/// `[insight]` section: which AI backend answers insight requests
#[derive(Debug, Clone, PartialEq)]
pub struct InsightSettings {
    /// Backend name: `gemini` or `mock`
    pub backend: String,
    /// Gemini API base URL
    pub base_url: String,
    /// Gemini model name
    pub model: String,
}

/// `[backup]` section
#[derive(Debug, Clone, PartialEq)]
pub struct BackupSettings {
    /// Backup directory; None means the platform data dir
    pub dir: Option<PathBuf>,
    /// Number of backups to retain when pruning
    pub keep: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreSettings {
                path: None,
                encrypt: true,
            },
            server: ServerSettings {
                bind: "127.0.0.1:3000".to_string(),
                admin_emails: Vec::new(),
                require_auth: true,
                api_key: None,
                static_dir: None,
            },
            insight: InsightSettings {
                backend: "gemini".to_string(),
                base_url: DEFAULT_BASE_URL.to_string(),
                model: DEFAULT_MODEL.to_string(),
            },
            backup: BackupSettings { dir: None, keep: 7 },
        }
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    store: Option<RawStore>,
    server: Option<RawServer>,
    insight: Option<RawInsight>,
    backup: Option<RawBackup>,
}

#[derive(Debug, Deserialize)]
struct RawStore {
    path: Option<PathBuf>,
    encrypt: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawServer {
    bind: Option<String>,
    admin_emails: Option<Vec<String>>,
    require_auth: Option<bool>,
    api_key: Option<String>,
    static_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawInsight {
    backend: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBackup {
    dir: Option<PathBuf>,
    keep: Option<usize>,
}

impl Config {
    /// Load configuration, resolving the file location and applying
    /// environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let mut config = match resolve_config_path(explicit) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a specific config file
    pub fn from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parse config from TOML content, applying values onto defaults
    fn parse(content: &str) -> Result<Config> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Config::default();

        if let Some(store) = raw.store {
            if let Some(path) = store.path {
                config.store.path = Some(path);
            }
            if let Some(encrypt) = store.encrypt {
                config.store.encrypt = encrypt;
            }
        }

        if let Some(server) = raw.server {
            if let Some(bind) = server.bind {
                config.server.bind = bind;
            }
            if let Some(emails) = server.admin_emails {
                config.server.admin_emails = normalize_emails(emails);
            }
            if let Some(require_auth) = server.require_auth {
                config.server.require_auth = require_auth;
            }
            if let Some(api_key) = server.api_key {
                config.server.api_key = Some(api_key);
            }
            if let Some(static_dir) = server.static_dir {
                config.server.static_dir = Some(static_dir);
            }
        }

        if let Some(insight) = raw.insight {
            if let Some(backend) = insight.backend {
                config.insight.backend = backend;
            }
            if let Some(base_url) = insight.base_url {
                config.insight.base_url = base_url;
            }
            if let Some(model) = insight.model {
                config.insight.model = model;
            }
        }

        if let Some(backup) = raw.backup {
            if let Some(dir) = backup.dir {
                config.backup.dir = Some(dir);
            }
            if let Some(keep) = backup.keep {
                config.backup.keep = keep;
            }
        }

        Ok(config)
    }

    /// Apply environment variable overrides on top of file values
    fn apply_env(&mut self) {
        if let Some(path) = non_empty_env("VANTAGE_DB") {
            self.store.path = Some(PathBuf::from(path));
        }
        if let Some(bind) = non_empty_env("VANTAGE_BIND") {
            self.server.bind = bind;
        }
        if let Some(emails) = non_empty_env("VANTAGE_ADMIN_EMAILS") {
            self.server.admin_emails =
                normalize_emails(emails.split(',').map(String::from).collect());
        }
        if let Some(backend) = non_empty_env("INSIGHT_BACKEND") {
            self.insight.backend = backend;
        }
        if let Some(base_url) = non_empty_env("GEMINI_BASE_URL") {
            self.insight.base_url = base_url;
        }
        if let Some(model) = non_empty_env("GEMINI_MODEL") {
            self.insight.model = model;
        }
    }
}

/// Default config file location (`{config_dir}/vantage/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vantage").join("config.toml"))
}

/// Resolve which config file to read, if any
fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = non_empty_env(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from("vantage.toml");
    if local.exists() {
        return Some(local);
    }
    default_config_path().filter(|p| p.exists())
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn normalize_emails(emails: Vec<String>) -> Vec<String> {
    emails
        .into_iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
