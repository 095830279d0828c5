//! Configuration
//!
//! Layered configuration for the registry, avatar generation, and logging.
//! Precedence (lowest to highest): built-in defaults, global config file,
//! workspace `deckgen.toml`, `DECKGEN__*` environment variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
pub mod workspace;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use workspace::storage_paths::{RegistryConfig, ResolvedPaths};

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::provider::{ProviderConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the per-workspace config file.
pub const WORKSPACE_CONFIG_FILE: &str = "deckgen.toml";

/// Avatar generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Prompt template file with a `{name}` placeholder; built-in prompt when unset.
    #[serde(default)]
    pub prompt_path: Option<PathBuf>,

    /// Retries after a rate-limited or transient failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Fixed delay between retries, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Target avatar count when `avatars` is run without `-n`.
    #[serde(default = "default_avatar_count")]
    pub default_avatar_count: usize,
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_avatar_count() -> usize {
    4
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            prompt_path: None,
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            default_avatar_count: default_avatar_count(),
        }
    }
}

impl GenerationConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_delay_ms)
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeckConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DeckConfig {
    /// Reject settings that would make the registry operations misbehave.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.registry.max_backups == 0 {
            return Err(ApiError::ConfigError(
                "registry.max_backups must be at least 1".to_string(),
            ));
        }
        if self.registry.resource_prefix.trim().trim_end_matches('/').is_empty() {
            return Err(ApiError::ConfigError(
                "registry.resource_prefix cannot be empty".to_string(),
            ));
        }
        if self.registry.data_path.as_os_str().is_empty() {
            return Err(ApiError::ConfigError(
                "registry.data_path cannot be empty".to_string(),
            ));
        }
        self.generation
            .provider
            .validate()
            .map_err(|e| ApiError::ConfigError(format!("generation.provider: {}", e)))?;
        Ok(())
    }
}
