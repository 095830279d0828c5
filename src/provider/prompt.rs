//! Avatar prompt template loading and rendering.

use crate::error::{ApiError, StorageError};
use crate::provider::PromptContext;
use std::path::{Path, PathBuf};

/// Used when no prompt file is configured.
pub const DEFAULT_AVATAR_PROMPT: &str =
    "Video game avatar of a {name}. GameBoy low-resolution pixel art.";

const NAME_PLACEHOLDER: &str = "{name}";

/// Resolve a prompt file path with support for absolute, tilde, and relative paths.
///
/// Relative paths resolve against `base_dir` (the workspace root).
pub fn resolve_prompt_path(path: &Path, base_dir: &Path) -> Result<PathBuf, ApiError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    if let Ok(rest) = path.strip_prefix("~") {
        let home =
            std::env::var("HOME").map_err(|_| ApiError::ConfigError("HOME not set".to_string()))?;
        return Ok(PathBuf::from(home).join(rest));
    }
    Ok(base_dir.join(path))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_AVATAR_PROMPT)
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Read a template file. A missing file is `NotFound`; an empty one is a config error.
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ApiError::NotFound(path.to_path_buf()))
            }
            Err(e) => return Err(StorageError::at(path, e).into()),
        };
        if content.trim().is_empty() {
            return Err(ApiError::ConfigError(format!(
                "Prompt file {} is empty",
                path.display()
            )));
        }
        Ok(Self::new(content.trim_end()))
    }

    pub fn render(&self, creature: &str) -> PromptContext {
        PromptContext {
            creature: creature.to_string(),
            prompt: self.template.replace(NAME_PLACEHOLDER, creature),
        }
    }
}
