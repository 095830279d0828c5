//! RegistryConfig and resolve_paths for workspace storage.

use crate::config::xdg;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_data_path() -> PathBuf {
    PathBuf::from("decks/generator/data.json")
}

fn default_avatar_dir() -> PathBuf {
    PathBuf::from("assets/sprites/avatars")
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("assets/sprites/avatars/raw")
}

fn default_resource_prefix() -> String {
    "res://assets/sprites/avatars".to_string()
}

fn default_max_backups() -> usize {
    50
}

/// Registry storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry JSON file (relative to workspace root)
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Finished avatar images (relative to workspace root)
    #[serde(default = "default_avatar_dir")]
    pub avatar_dir: PathBuf,

    /// Raw generator output (relative to workspace root)
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,

    /// Logical prefix of avatar references stored in the registry
    #[serde(default = "default_resource_prefix")]
    pub resource_prefix: String,

    /// Backup directory; defaults to the workspace's XDG data directory
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,

    /// Number of registry backups to keep
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,
}

/// Absolute locations derived from [`RegistryConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub data_path: PathBuf,
    pub avatar_dir: PathBuf,
    pub raw_dir: PathBuf,
    pub backup_dir: PathBuf,
}

impl RegistryConfig {
    /// Resolve configured paths against the workspace root.
    pub fn resolve_paths(&self, workspace_root: &Path) -> Result<ResolvedPaths, ApiError> {
        let backup_dir = match &self.backup_dir {
            Some(dir) => workspace_root.join(dir),
            None => xdg::workspace_data_dir(workspace_root)?.join("backups"),
        };

        Ok(ResolvedPaths {
            data_path: workspace_root.join(&self.data_path),
            avatar_dir: workspace_root.join(&self.avatar_dir),
            raw_dir: workspace_root.join(&self.raw_dir),
            backup_dir,
        })
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            avatar_dir: default_avatar_dir(),
            raw_dir: default_raw_dir(),
            resource_prefix: default_resource_prefix(),
            backup_dir: None,
            max_backups: default_max_backups(),
        }
    }
}
