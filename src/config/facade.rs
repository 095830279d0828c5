//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::DeckConfig;
use crate::error::{ApiError, StorageError};
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from files and environment.
    pub fn load(workspace_root: &Path) -> Result<DeckConfig, ApiError> {
        let config = MergeService::load(workspace_root)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<DeckConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::NotFound(path.to_path_buf()));
        }
        let config = MergeService::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration.
    pub fn default() -> DeckConfig {
        DeckConfig::default()
    }

    /// Write the default configuration as TOML. Returns false if `path` already exists.
    pub fn write_default(path: &Path) -> Result<bool, ApiError> {
        if path.exists() {
            return Ok(false);
        }
        let content = toml::to_string_pretty(&DeckConfig::default())
            .map_err(|e| ApiError::StorageError(StorageError::Serialization(e.to_string())))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::at(parent, e))?;
        }
        std::fs::write(path, content).map_err(|e| StorageError::at(path, e))?;
        Ok(true)
    }
}
