//! Concrete avatar generation back ends.

pub mod openai;

pub use openai::OpenAiImageClient;

use crate::error::ApiError;
use crate::provider::{AvatarGenerator, ProviderConfig};
use std::path::Path;

/// Build the generator described by `config`, writing raw images to `raw_dir`.
///
/// Both provider types speak the OpenAI images API; they differ only in
/// endpoint and key requirements.
pub fn create_generator(
    config: &ProviderConfig,
    raw_dir: &Path,
) -> Result<Box<dyn AvatarGenerator>, ApiError> {
    config.validate().map_err(ApiError::ConfigError)?;
    Ok(Box::new(OpenAiImageClient::new(config, raw_dir)?))
}
