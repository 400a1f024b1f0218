//! Database backup operations using SQLCipher export
//!
//! Creates consistent backups with SQLCipher's `sqlcipher_export()`, which
//! works safely while the database is in use. Encrypted stores back up with
//! the same derived key; unencrypted stores back up unencrypted.

use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use super::Database;
use crate::backup::{generate_backup_name, BackupDestination, BackupResult, RetentionPolicy};
use crate::error::{Error, Result};

impl Database {
    /// Create a backup of the database
    ///
    /// # Arguments
    /// * `destination` - Where to store the backup
    /// * `backup_name` - Optional name override (defaults to timestamped name)
    pub fn create_backup(
        &self,
        destination: &dyn BackupDestination,
        backup_name: Option<&str>,
    ) -> Result<BackupResult> {
        let conn = self.conn()?;

        // Row counts reported alongside the backup
        let clients: i64 = conn.query_row("SELECT COUNT(*) FROM clients", [], |row| row.get(0))?;
        let campaigns: i64 =
            conn.query_row("SELECT COUNT(*) FROM campaigns", [], |row| row.get(0))?;

        let name = backup_name
            .map(String::from)
            .unwrap_or_else(generate_backup_name);

        // Raw snapshot lands in a temp file, the destination compresses it
        let temp_backup = NamedTempFile::new()
            .map_err(|e| Error::Backup(format!("Failed to create temp file: {}", e)))?;
        let temp_path = temp_backup.path();

        // Export into an attached database. An encrypted store attaches with
        // its own derived key so the snapshot stays encrypted at rest.
        let attach_sql = match std::env::var(super::DB_KEY_ENV).ok() {
            Some(passphrase) => {
                let key = super::derive_key(&passphrase)?;
                format!(
                    "ATTACH DATABASE '{}' AS snapshot KEY 'x\"{}\"';",
                    temp_path.display(),
                    key
                )
            }
            None => format!(
                "ATTACH DATABASE '{}' AS snapshot KEY '';",
                temp_path.display()
            ),
        };

        conn.execute_batch(&attach_sql)
            .map_err(|e| Error::Backup(format!("Failed to attach snapshot database: {}", e)))?;

        // sqlcipher_export returns a result row, so use query_row
        conn.query_row("SELECT sqlcipher_export('snapshot');", [], |_row| Ok(()))
            .map_err(|e| Error::Backup(format!("sqlcipher_export failed: {}", e)))?;

        conn.execute_batch("DETACH DATABASE snapshot;")
            .map_err(|e| Error::Backup(format!("Failed to detach snapshot database: {}", e)))?;

        info!("Created raw backup at: {}", temp_path.display());

        let stored_name = destination.store(temp_path, &name)?;

        let info = destination
            .list()?
            .into_iter()
            .find(|b| b.name == stored_name)
            .ok_or_else(|| Error::Backup("Backup not found after storing".to_string()))?;

        info!("Backup complete: {} ({} bytes)", info.name, info.size);

        Ok(BackupResult {
            info,
            clients,
            campaigns,
        })
    }

    /// Restore a database from backup
    ///
    /// # Arguments
    /// * `destination` - Where the backup is stored
    /// * `backup_name` - Name of the backup to restore
    /// * `target_path` - Where to restore the database
    /// * `force` - Overwrite an existing database at the target
    pub fn restore_backup(
        destination: &dyn BackupDestination,
        backup_name: &str,
        target_path: &Path,
        force: bool,
    ) -> Result<()> {
        use std::fs;

        if target_path.exists() {
            if !force {
                return Err(Error::Backup(format!(
                    "Database already exists at {}. Use force=true to overwrite.",
                    target_path.display()
                )));
            }

            fs::remove_file(target_path)
                .map_err(|e| Error::Backup(format!("Failed to remove existing database: {}", e)))?;

            // Stale WAL/SHM sidecars would corrupt the restored file
            let _ = fs::remove_file(format!("{}-wal", target_path.display()));
            let _ = fs::remove_file(format!("{}-shm", target_path.display()));
        }

        destination.retrieve(backup_name, target_path)?;

        info!("Restored backup to: {}", target_path.display());
        Ok(())
    }

    /// List available backups
    pub fn list_backups(
        destination: &dyn BackupDestination,
    ) -> Result<Vec<crate::backup::BackupInfo>> {
        destination.list()
    }

    /// Prune old backups according to retention policy
    pub fn prune_backups(
        destination: &dyn BackupDestination,
        policy: &RetentionPolicy,
    ) -> Result<crate::backup::PruneResult> {
        destination.prune(policy)
    }
}
