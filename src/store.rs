//! JSON record store with backup-then-overwrite persistence
//!
//! The prior file is always copied to the backup path before the new content
//! is written, and the write itself goes through a temporary sibling file and
//! a rename. A crash at any point leaves either the old store or the backup
//! holding the last good state.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{DstError, Result};
use crate::record::TimezoneRecord;

#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    backup_path: PathBuf,
}

/// Default backup location: the store path with `.backup` appended.
pub fn default_backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".backup");
    PathBuf::from(name)
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>, backup_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_path: backup_path.into(),
        }
    }

    pub fn with_default_backup(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let backup_path = default_backup_path(&path);
        Self { path, backup_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Read the full record set. Missing or unparseable files are fatal.
    pub fn load(&self) -> Result<Vec<TimezoneRecord>> {
        let text = fs::read_to_string(&self.path).map_err(|e| self.unavailable(e))?;
        let records: Vec<TimezoneRecord> =
            serde_json::from_str(&text).map_err(|e| self.unavailable(e))?;
        debug!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    /// Copy the current store file over any previous backup.
    pub fn backup(&self) -> Result<()> {
        fs::copy(&self.path, &self.backup_path).map_err(|e| self.not_saved(e))?;
        debug!(
            "Backed up {} to {}",
            self.path.display(),
            self.backup_path.display()
        );
        Ok(())
    }

    /// Write the full record set, pretty-printed. Callers go through
    /// [`RecordStore::persist`] so the backup always comes first.
    pub fn save(&self, records: &[TimezoneRecord]) -> Result<()> {
        let mut text = serde_json::to_string_pretty(records).map_err(|e| self.not_saved(e))?;
        text.push('\n');

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, text).map_err(|e| self.not_saved(e))?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(self.not_saved(e));
        }
        Ok(())
    }

    /// Backup, then save. Nothing is written if the backup fails.
    pub fn persist(&self, records: &[TimezoneRecord]) -> Result<()> {
        self.backup()?;
        self.save(records)?;
        info!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn unavailable(&self, err: impl std::fmt::Display) -> DstError {
        DstError::StoreUnavailable {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }

    fn not_saved(&self, err: impl std::fmt::Display) -> DstError {
        DstError::NotSaved {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }
}
