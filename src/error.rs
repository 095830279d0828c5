//! Error types for the deck asset registry.

use std::path::PathBuf;
use thiserror::Error;

/// Low-level storage failures (filesystem and serialization).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("I/O error at {path}: {source}")]
    PathIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Attach the offending path to an I/O error.
    pub fn at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::PathIo {
            path: path.into(),
            source,
        }
    }
}

/// Errors surfaced by registry operations and the CLI.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Registry file, prompt file, or other required input is missing.
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Registry content is not valid JSON or does not match the schema.
    #[error("Invalid registry format in {}: {message}", .path.display())]
    Format { path: PathBuf, message: String },

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    /// Operation targets a noun or adjective that is not in the registry.
    #[error("Unknown {kind}: {key}")]
    UnknownEntry { kind: String, key: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Provider rate limit: {0}")]
    ProviderRateLimit(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Avatar generation failed: {0}")]
    GenerationFailed(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl ApiError {
    /// Whether a generation call that failed with this error may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::ProviderRateLimit(_) => true,
            ApiError::ProviderRequestFailed(_) => true,
            ApiError::ConfigError(_) => false,
            ApiError::ProviderNotConfigured(_) => false,
            _ => false,
        }
    }
}
