//! OpenAI images API client.

use crate::avatar::layout::{create_next_free, creature_slug};
use crate::error::{ApiError, StorageError};
use crate::provider::{AvatarGenerator, PromptContext, ProviderConfig, RawImage};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: usize,
    size: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}

pub struct OpenAiImageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    size: String,
    images_per_request: usize,
    raw_dir: PathBuf,
}

impl OpenAiImageClient {
    pub fn new(config: &ProviderConfig, raw_dir: &Path) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::ProviderError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.base_url()?,
            api_key: config.resolve_api_key()?,
            model: config.model.clone(),
            size: config.size.clone(),
            images_per_request: config.images_per_request.max(1),
            raw_dir: raw_dir.to_path_buf(),
        })
    }

    async fn request_batch(&self, prompt: &str, n: usize) -> Result<Vec<Vec<u8>>, ApiError> {
        let url = format!("{}/images/generations", self.base_url);
        let body = ImageRequest {
            model: &self.model,
            prompt,
            n,
            size: &self.size,
            response_format: "b64_json",
        };

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::ProviderRequestFailed(format!("{}: {}", url, e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::ProviderRateLimit(format!(
                "{} returned {}",
                url, status
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = format!("{} returned {}: {}", url, status, text);
            return Err(if status.is_server_error() {
                ApiError::ProviderRequestFailed(message)
            } else {
                ApiError::ProviderError(message)
            });
        }

        let parsed: ImageResponse = response
            .json()
            .await
            .map_err(|e| ApiError::ProviderError(format!("Invalid image response: {}", e)))?;

        parsed
            .data
            .into_iter()
            .map(|item| {
                let encoded = item.b64_json.ok_or_else(|| {
                    ApiError::ProviderError("Image response missing b64_json".to_string())
                })?;
                base64::engine::general_purpose::STANDARD
                    .decode(encoded.as_bytes())
                    .map_err(|e| ApiError::ProviderError(format!("Invalid image payload: {}", e)))
            })
            .collect()
    }

    fn store_raw(&self, slug: &str, bytes: &[u8]) -> Result<RawImage, ApiError> {
        let (path, mut file) = create_next_free(&self.raw_dir, slug, "png")?;
        file.write_all(bytes).map_err(|e| StorageError::at(&path, e))?;
        debug!(path = %path.display(), "Saved raw image");
        Ok(RawImage { path })
    }
}

#[async_trait]
impl AvatarGenerator for OpenAiImageClient {
    async fn generate(
        &self,
        prompt: &PromptContext,
        count: usize,
    ) -> Result<Vec<RawImage>, ApiError> {
        std::fs::create_dir_all(&self.raw_dir).map_err(|e| StorageError::at(&self.raw_dir, e))?;
        let slug = creature_slug(&prompt.creature);

        let mut images = Vec::with_capacity(count);
        while images.len() < count {
            let n = (count - images.len()).min(self.images_per_request);
            info!(
                creature = %prompt.creature,
                model = %self.model,
                n,
                "Requesting avatar images"
            );
            let batch = self.request_batch(&prompt.prompt, n).await?;
            if batch.is_empty() {
                return Err(ApiError::GenerationFailed(format!(
                    "Provider returned no images for {}",
                    prompt.creature
                )));
            }
            for bytes in batch.iter().take(count - images.len()) {
                images.push(self.store_raw(&slug, bytes)?);
            }
        }
        Ok(images)
    }

    fn batch_limit(&self) -> Option<usize> {
        Some(self.images_per_request)
    }
}
