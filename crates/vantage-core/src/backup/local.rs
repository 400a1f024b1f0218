//! Local filesystem backup destination

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::info;

use super::{parse_backup_time, BackupDestination, BackupInfo};
use crate::error::{Error, Result};

/// Local filesystem backup destination
pub struct LocalDestination {
    /// Directory where backups are stored
    backup_dir: PathBuf,
}

impl LocalDestination {
    /// Create a new local destination
    ///
    /// Creates the backup directory if it doesn't exist.
    pub fn new(backup_dir: impl Into<PathBuf>) -> Result<Self> {
        let backup_dir = backup_dir.into();

        if !backup_dir.exists() {
            fs::create_dir_all(&backup_dir).map_err(|e| {
                Error::Backup(format!(
                    "Failed to create backup directory {}: {}",
                    backup_dir.display(),
                    e
                ))
            })?;
            info!("Created backup directory: {}", backup_dir.display());
        }

        Ok(Self { backup_dir })
    }

    /// Get the full path for a backup name
    fn backup_path(&self, name: &str) -> PathBuf {
        self.backup_dir.join(name)
    }

    /// Get the backup directory path
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }
}

impl BackupDestination for LocalDestination {
    fn name(&self) -> &str {
        "local"
    }

    fn store(&self, local_path: &Path, backup_name: &str) -> Result<String> {
        let dest_path = self.backup_path(backup_name);

        if dest_path.exists() {
            return Err(Error::Backup(format!(
                "Backup already exists: {}",
                dest_path.display()
            )));
        }

        let dest_wants_gz = backup_name.ends_with(".gz");
        let source_is_gz = local_path.to_string_lossy().ends_with(".gz");

        if dest_wants_gz && !source_is_gz {
            // Compress while copying
            let mut reader = BufReader::new(File::open(local_path)?);
            let writer = BufWriter::new(File::create(&dest_path)?);
            let mut encoder = GzEncoder::new(writer, Compression::default());
            io::copy(&mut reader, &mut encoder)?;
            encoder.finish()?.flush()?;
        } else {
            fs::copy(local_path, &dest_path)?;
        }

        info!("Stored backup: {}", dest_path.display());
        Ok(backup_name.to_string())
    }

    fn retrieve(&self, backup_name: &str, local_path: &Path) -> Result<()> {
        let source_path = self.backup_path(backup_name);

        if !source_path.exists() {
            return Err(Error::Backup(format!(
                "Backup not found: {}",
                source_path.display()
            )));
        }

        let source_is_gz = backup_name.ends_with(".gz");
        let dest_wants_raw = !local_path.to_string_lossy().ends_with(".gz");

        if source_is_gz && dest_wants_raw {
            // Decompress while copying
            let mut decoder = GzDecoder::new(BufReader::new(File::open(&source_path)?));
            let mut writer = BufWriter::new(File::create(local_path)?);
            io::copy(&mut decoder, &mut writer)?;
            writer.flush()?;
        } else {
            fs::copy(&source_path, local_path)?;
        }

        info!("Retrieved backup to: {}", local_path.display());
        Ok(())
    }

    fn list(&self) -> Result<Vec<BackupInfo>> {
        let mut backups = Vec::new();

        if !self.backup_dir.exists() {
            return Ok(backups);
        }

        for entry in fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            let path = entry.path();

            // Only include files our backup system produced
            let file_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) if name.starts_with("vantage-") => name.to_string(),
                _ => continue,
            };

            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            let created_at = parse_backup_time(&file_name).unwrap_or_else(Utc::now);

            backups.push(BackupInfo {
                compressed: file_name.ends_with(".gz"),
                name: file_name,
                path: path.to_string_lossy().to_string(),
                size: metadata.len(),
                created_at,
            });
        }

        // Newest first
        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(backups)
    }

    fn delete(&self, backup_name: &str) -> Result<()> {
        let path = self.backup_path(backup_name);

        if !path.exists() {
            return Err(Error::Backup(format!(
                "Backup not found: {}",
                path.display()
            )));
        }

        fs::remove_file(&path)?;
        info!("Deleted backup: {}", path.display());
        Ok(())
    }
}
