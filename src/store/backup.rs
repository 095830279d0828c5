//! Registry backups with bounded retention.
//!
//! Backups are named `<stem>.<YYYYMMDD-HHMMSS>.<ext>`; a second backup within the
//! same second gets a `-<n>` suffix on the timestamp. Retention only ever deletes
//! files matching that pattern for the registry being backed up.

use crate::error::{ApiError, StorageError};
use chrono::{Local, NaiveDateTime};
use std::cmp::Ordering;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
const TIMESTAMP_LEN: usize = 15;

/// A backup file recognized by the naming convention.
#[derive(Debug, Clone)]
pub struct BackupRecord {
    pub path: PathBuf,
    pub timestamp: NaiveDateTime,
    /// Same-second disambiguator; 0 for the unsuffixed name.
    pub sequence: u32,
    pub created: SystemTime,
}

impl BackupRecord {
    fn creation_order(&self, other: &Self) -> Ordering {
        self.created
            .cmp(&other.created)
            .then_with(|| self.timestamp.cmp(&other.timestamp))
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

/// Result of a single backup run.
#[derive(Debug, Clone)]
pub struct BackupOutcome {
    pub created: PathBuf,
    pub pruned: Vec<PathBuf>,
}

/// Naming convention derived from the registry file name.
#[derive(Debug, Clone)]
struct BackupName {
    stem: String,
    ext: Option<String>,
}

impl BackupName {
    fn for_source(source: &Path) -> Result<Self, ApiError> {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ApiError::ConfigError(format!(
                    "Cannot derive backup name from {}",
                    source.display()
                ))
            })?;
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_string);
        Ok(Self {
            stem: stem.to_string(),
            ext,
        })
    }

    fn file_name(&self, timestamp: &NaiveDateTime, sequence: u32) -> String {
        let mut name = format!("{}.{}", self.stem, timestamp.format(TIMESTAMP_FORMAT));
        if sequence > 0 {
            name.push_str(&format!("-{}", sequence));
        }
        if let Some(ext) = &self.ext {
            name.push('.');
            name.push_str(ext);
        }
        name
    }

    fn parse(&self, file_name: &str) -> Option<(NaiveDateTime, u32)> {
        let rest = file_name.strip_prefix(&self.stem)?.strip_prefix('.')?;
        let middle = match &self.ext {
            Some(ext) => rest.strip_suffix(ext.as_str())?.strip_suffix('.')?,
            None => rest,
        };
        if middle.len() < TIMESTAMP_LEN || !middle.is_char_boundary(TIMESTAMP_LEN) {
            return None;
        }
        let (stamp, suffix) = middle.split_at(TIMESTAMP_LEN);
        let timestamp = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
        let sequence = if suffix.is_empty() {
            0
        } else {
            let digits = suffix.strip_prefix('-')?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            digits.parse().ok()?
        };
        Some((timestamp, sequence))
    }
}

/// Copies the registry file aside before it is overwritten and prunes old copies.
#[derive(Debug, Clone)]
pub struct BackupManager {
    backup_dir: PathBuf,
    max_backups: usize,
}

impl BackupManager {
    pub fn new(backup_dir: impl Into<PathBuf>, max_backups: usize) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            max_backups,
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn max_backups(&self) -> usize {
        self.max_backups
    }

    /// Back up `source` using the current local time.
    pub fn backup(&self, source: &Path) -> Result<BackupOutcome, ApiError> {
        self.backup_at(source, Local::now().naive_local())
    }

    /// Back up `source` as of `now`, then enforce retention.
    pub fn backup_at(&self, source: &Path, now: NaiveDateTime) -> Result<BackupOutcome, ApiError> {
        let naming = BackupName::for_source(source)?;
        fs::create_dir_all(&self.backup_dir)
            .map_err(|e| StorageError::at(&self.backup_dir, e))?;

        let created = self.copy_exclusive(source, &naming, &now)?;
        info!(
            source = %source.display(),
            backup = %created.display(),
            "Created registry backup"
        );

        let pruned = self.prune(&naming)?;
        Ok(BackupOutcome { created, pruned })
    }

    /// Recognized backups of `source`, oldest first.
    pub fn list(&self, source: &Path) -> Result<Vec<BackupRecord>, ApiError> {
        let naming = BackupName::for_source(source)?;
        self.list_records(&naming)
    }

    fn copy_exclusive(
        &self,
        source: &Path,
        naming: &BackupName,
        now: &NaiveDateTime,
    ) -> Result<PathBuf, ApiError> {
        let mut input = fs::File::open(source).map_err(|e| StorageError::at(source, e))?;
        // Continue after the highest surviving suffix so a pruned name is never reused.
        let mut sequence = self
            .list_records(naming)?
            .iter()
            .filter(|r| r.timestamp == *now)
            .map(|r| r.sequence + 1)
            .max()
            .unwrap_or(0);
        loop {
            let target = self.backup_dir.join(naming.file_name(now, sequence));
            match OpenOptions::new().write(true).create_new(true).open(&target) {
                Ok(mut output) => {
                    let copied = io::copy(&mut input, &mut output)
                        .and_then(|_| output.sync_all())
                        .map_err(|e| StorageError::at(&target, e));
                    if let Err(e) = copied {
                        let _ = fs::remove_file(&target);
                        return Err(e.into());
                    }
                    return Ok(target);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(path = %target.display(), "Backup name taken, trying next suffix");
                    sequence += 1;
                }
                Err(e) => return Err(StorageError::at(&target, e).into()),
            }
        }
    }

    fn list_records(&self, naming: &BackupName) -> Result<Vec<BackupRecord>, ApiError> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }
        let entries =
            fs::read_dir(&self.backup_dir).map_err(|e| StorageError::at(&self.backup_dir, e))?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::at(&self.backup_dir, e))?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some((timestamp, sequence)) = naming.parse(file_name) else {
                continue;
            };
            let metadata = entry
                .metadata()
                .map_err(|e| StorageError::at(entry.path(), e))?;
            if !metadata.is_file() {
                continue;
            }
            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            records.push(BackupRecord {
                path: entry.path(),
                timestamp,
                sequence,
                created,
            });
        }
        records.sort_by(|a, b| a.creation_order(b));
        Ok(records)
    }

    fn prune(&self, naming: &BackupName) -> Result<Vec<PathBuf>, ApiError> {
        let records = self.list_records(naming)?;
        if records.len() <= self.max_backups {
            return Ok(Vec::new());
        }
        let excess = records.len() - self.max_backups;
        let mut pruned = Vec::with_capacity(excess);
        for record in records.into_iter().take(excess) {
            fs::remove_file(&record.path).map_err(|e| StorageError::at(&record.path, e))?;
            debug!(path = %record.path.display(), "Pruned old registry backup");
            pruned.push(record.path);
        }
        info!(
            pruned = pruned.len(),
            kept = self.max_backups,
            "Enforced backup retention"
        );
        Ok(pruned)
    }
}
