//! Backup API handlers (admin only)

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

use vantage_core::backup::{default_backup_dir, LocalDestination, RetentionPolicy};

use crate::{require_admin, AppError, AppState};

/// Create backup request
#[derive(Debug, Deserialize)]
pub struct CreateBackupRequest {
    /// Optional backup name (defaults to timestamped name)
    pub name: Option<String>,
}

/// Create backup response
#[derive(Debug, Serialize)]
pub struct CreateBackupResponse {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub clients: i64,
    pub campaigns: i64,
    pub compressed: bool,
}

/// List backups response
#[derive(Debug, Serialize)]
pub struct BackupInfo {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub created_at: String,
    pub compressed: bool,
}

/// Prune request
#[derive(Debug, Deserialize)]
pub struct PruneBackupsRequest {
    /// Number of backups to keep (default: 7)
    pub keep: Option<usize>,
}

/// Prune response
#[derive(Debug, Serialize)]
pub struct PruneBackupsResponse {
    pub deleted_count: usize,
    pub deleted_names: Vec<String>,
    pub retained_count: usize,
    pub bytes_freed: u64,
}

/// Get backup directory from state or default
fn get_backup_dir(state: &AppState) -> std::path::PathBuf {
    state.backup_dir.clone().unwrap_or_else(default_backup_dir)
}

/// POST /api/backups - Create a backup (admin only)
pub async fn create_backup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateBackupRequest>,
) -> Result<Json<CreateBackupResponse>, AppError> {
    let viewer = require_admin(&state, &headers)?;

    let backup_dir = get_backup_dir(&state);
    let destination = LocalDestination::new(&backup_dir)
        .map_err(|e| AppError::internal(&format!("Failed to access backup directory: {}", e)))?;

    let result = state
        .db
        .create_backup(&destination, req.name.as_deref())
        .map_err(|e| AppError::internal(&format!("Failed to create backup: {}", e)))?;

    // Log audit
    state.db.log_audit(
        &viewer.email,
        "backup_created",
        Some("backup"),
        None,
        Some(&format!("name={}", result.info.name)),
    )?;

    Ok(Json(CreateBackupResponse {
        name: result.info.name,
        path: result.info.path,
        size: result.info.size,
        clients: result.clients,
        campaigns: result.campaigns,
        compressed: result.info.compressed,
    }))
}

/// GET /api/backups - List available backups (admin only)
pub async fn list_backups(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<BackupInfo>>, AppError> {
    let viewer = require_admin(&state, &headers)?;

    let backup_dir = get_backup_dir(&state);

    // Check if backup directory exists
    if !backup_dir.exists() {
        return Ok(Json(vec![]));
    }

    let destination = LocalDestination::new(&backup_dir)
        .map_err(|e| AppError::internal(&format!("Failed to access backup directory: {}", e)))?;

    let backups = vantage_core::Database::list_backups(&destination)
        .map_err(|e| AppError::internal(&format!("Failed to list backups: {}", e)))?;

    // Log audit
    state.db.log_audit(
        &viewer.email,
        "backup_list",
        Some("backup"),
        None,
        Some(&format!("count={}", backups.len())),
    )?;

    let response: Vec<BackupInfo> = backups
        .into_iter()
        .map(|b| BackupInfo {
            name: b.name,
            path: b.path,
            size: b.size,
            created_at: b.created_at.to_rfc3339(),
            compressed: b.compressed,
        })
        .collect();

    Ok(Json(response))
}

/// POST /api/backups/prune - Prune old backups (admin only)
pub async fn prune_backups(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<PruneBackupsRequest>,
) -> Result<Json<PruneBackupsResponse>, AppError> {
    let viewer = require_admin(&state, &headers)?;

    let backup_dir = get_backup_dir(&state);
    let destination = LocalDestination::new(&backup_dir)
        .map_err(|e| AppError::internal(&format!("Failed to access backup directory: {}", e)))?;

    let keep = req.keep.unwrap_or(7);
    let policy = RetentionPolicy::keep_last(keep);

    let result = vantage_core::Database::prune_backups(&destination, &policy)
        .map_err(|e| AppError::internal(&format!("Failed to prune backups: {}", e)))?;

    // Log audit
    state.db.log_audit(
        &viewer.email,
        "backup_prune",
        Some("backup"),
        None,
        Some(&format!("keep={}, deleted={}", keep, result.deleted_count)),
    )?;

    Ok(Json(PruneBackupsResponse {
        deleted_count: result.deleted_count,
        deleted_names: result.deleted_names,
        retained_count: result.retained_count,
        bytes_freed: result.bytes_freed,
    }))
}
