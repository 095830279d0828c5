//! Avatar generation collaborators.
//!
//! The registry core only sees two contracts: a generator that turns a prompt
//! into raw images, and a post-processor that turns one raw image into a
//! finished avatar resource. Concrete back ends live under `clients` and
//! `postprocess`.

pub mod clients;
pub mod postprocess;
pub mod profile;
pub mod prompt;
pub mod retry;

pub use clients::{create_generator, OpenAiImageClient};
pub use postprocess::PixelAvatarFormatter;
pub use profile::{ProviderConfig, ProviderType};
pub use prompt::{resolve_prompt_path, PromptTemplate};
pub use retry::RetryPolicy;

use crate::error::ApiError;
use crate::types::ResourceRef;
use async_trait::async_trait;
use std::path::PathBuf;

/// What the generator is asked to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    /// Registry key of the creature.
    pub creature: String,
    /// Fully rendered prompt text.
    pub prompt: String,
}

/// Handle to a generated image before post-processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub path: PathBuf,
}

/// Image generation back end.
///
/// Async because generation is a network or model-inference call.
#[async_trait]
pub trait AvatarGenerator: Send + Sync {
    /// Produce `count` raw images for `prompt`.
    ///
    /// Rate limiting surfaces as [`ApiError::ProviderRateLimit`]; the caller
    /// owns retries.
    async fn generate(&self, prompt: &PromptContext, count: usize)
        -> Result<Vec<RawImage>, ApiError>;

    /// Most images one request can return, if the back end has a limit.
    ///
    /// Callers that retry split larger requests so a retry only repeats the
    /// request that failed.
    fn batch_limit(&self) -> Option<usize> {
        None
    }
}

/// Deterministic one-to-one conversion of a raw image into an avatar resource.
pub trait AvatarPostProcessor: Send + Sync {
    fn format(&self, raw: &RawImage) -> Result<ResourceRef, ApiError>;
}
