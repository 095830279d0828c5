//! JSON persistence for the registry.

use crate::error::{ApiError, StorageError};
use crate::store::backup::{BackupManager, BackupOutcome};
use crate::store::Registry;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Flags for [`RegistryStore::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Back up the current on-disk file before overwriting it.
    pub backup: bool,
    /// Write entries in canonical `(level, key)` order.
    pub sort: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            backup: true,
            sort: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub path: PathBuf,
    pub backup: Option<BackupOutcome>,
}

/// Loads and saves the registry file at a fixed path.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
    backups: Option<BackupManager>,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backups: None,
        }
    }

    pub fn with_backups(mut self, backups: BackupManager) -> Self {
        self.backups = Some(backups);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backups(&self) -> Option<&BackupManager> {
        self.backups.as_ref()
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<Registry, ApiError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ApiError::NotFound(self.path.clone()))
            }
            Err(e) => return Err(StorageError::at(&self.path, e).into()),
        };

        let mut registry: Registry =
            serde_json::from_str(&content).map_err(|e| ApiError::Format {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        registry.validate().map_err(|message| ApiError::Format {
            path: self.path.clone(),
            message,
        })?;

        let collapsed = registry.dedup_avatars();
        if collapsed > 0 {
            warn!(
                path = %self.path.display(),
                collapsed,
                "Collapsed duplicate avatar references"
            );
        }

        debug!(
            path = %self.path.display(),
            nouns = registry.nouns.len(),
            adjectives = registry.adjectives.len(),
            "Loaded registry"
        );
        Ok(registry)
    }

    /// Write `registry` to disk, replacing the file.
    ///
    /// The backup (if requested) captures the file as last saved and finishes
    /// before the new content is written.
    pub fn save(&self, registry: &Registry, options: SaveOptions) -> Result<SaveOutcome, ApiError> {
        let sorted;
        let to_write = if options.sort {
            sorted = registry.sorted();
            &sorted
        } else {
            registry
        };
        let bytes = to_json_bytes(to_write)?;

        let backup = if options.backup {
            self.run_backup()?
        } else {
            None
        };

        write_atomic(&self.path, &bytes)?;
        info!(
            path = %self.path.display(),
            sorted = options.sort,
            backed_up = backup.is_some(),
            "Saved registry"
        );

        Ok(SaveOutcome {
            path: self.path.clone(),
            backup,
        })
    }

    /// Create an empty registry file. Refuses to overwrite an existing one.
    pub fn init(&self) -> Result<Registry, ApiError> {
        if self.path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Registry already exists: {}",
                self.path.display()
            )));
        }
        let registry = Registry::new();
        write_atomic(&self.path, &to_json_bytes(&registry)?)?;
        info!(path = %self.path.display(), "Initialized empty registry");
        Ok(registry)
    }

    fn run_backup(&self) -> Result<Option<BackupOutcome>, ApiError> {
        let Some(manager) = &self.backups else {
            return Err(ApiError::ConfigError(
                "Backup requested but no backup directory is configured".to_string(),
            ));
        };
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No saved registry yet, skipping backup");
            return Ok(None);
        }
        manager.backup(&self.path).map(Some)
    }
}

/// Pretty JSON with the 3-space indent the game's data files use.
pub fn to_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"   ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Write through a sibling temp file and rename over the target.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ApiError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StorageError::at(parent, e))?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let written = fs::File::create(&tmp_path).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(StorageError::at(&tmp_path, e).into());
    }
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        StorageError::at(path, e)
    })?;
    Ok(())
}
