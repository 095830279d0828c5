use crate::error::ApiError;
use serde::{Deserialize, Serialize};

pub const OPENAI_DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Image provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type.
    #[serde(default = "default_provider_type")]
    pub provider_type: ProviderType,

    /// Image model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// API key optional and can be loaded from environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL; defaults to the public OpenAI API for `openai`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Requested image size, `<width>x<height>`.
    #[serde(default = "default_size")]
    pub size: String,

    /// Upper bound on images requested in a single API call.
    #[serde(default = "default_images_per_request")]
    pub images_per_request: usize,
}

/// Provider type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderType {
    #[serde(rename = "openai")]
    OpenAI,
    /// Self-hosted server speaking the OpenAI images API.
    #[serde(rename = "local")]
    LocalCustom,
}

fn default_provider_type() -> ProviderType {
    ProviderType::OpenAI
}

fn default_model() -> String {
    "dall-e-2".to_string()
}

fn default_size() -> String {
    "256x256".to_string()
}

fn default_images_per_request() -> usize {
    4
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            model: default_model(),
            api_key: None,
            endpoint: None,
            size: default_size(),
            images_per_request: default_images_per_request(),
        }
    }
}

impl ProviderConfig {
    fn endpoint_has_scheme(endpoint: &str) -> bool {
        endpoint.starts_with("http://") || endpoint.starts_with("https://")
    }

    fn infer_endpoint_scheme(provider_type: ProviderType, endpoint: &str) -> String {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if provider_type == ProviderType::LocalCustom && !Self::endpoint_has_scheme(endpoint) {
            format!("https://{}", endpoint)
        } else {
            endpoint.to_string()
        }
    }

    pub fn normalized_endpoint(&self) -> Option<String> {
        self.endpoint
            .as_deref()
            .map(|endpoint| Self::infer_endpoint_scheme(self.provider_type, endpoint))
    }

    pub fn endpoint_url_is_valid(provider_type: ProviderType, endpoint: &str) -> bool {
        let endpoint = Self::infer_endpoint_scheme(provider_type, endpoint);
        if !Self::endpoint_has_scheme(&endpoint) {
            return false;
        }

        let Some(rest) = endpoint.split_once("://").map(|(_, rest)| rest) else {
            return false;
        };

        if rest.is_empty() || rest.chars().any(char::is_whitespace) {
            return false;
        }

        let authority = rest.split('/').next().unwrap_or_default();
        let host_port = authority.rsplit('@').next().unwrap_or(authority);
        let host = if host_port.starts_with('[') {
            let Some(end_bracket) = host_port.find(']') else {
                return false;
            };
            &host_port[1..end_bracket]
        } else {
            host_port.split(':').next().unwrap_or_default()
        };

        if host.is_empty() {
            return false;
        }

        host == "localhost" || host.contains('.') || host.parse::<std::net::IpAddr>().is_ok()
    }

    /// Validate provider configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }

        if let Some(endpoint) = &self.endpoint {
            if !Self::endpoint_url_is_valid(self.provider_type, endpoint) {
                return Err(format!("Invalid endpoint URL: {}", endpoint));
            }
        }

        if self.images_per_request == 0 {
            return Err("images_per_request must be at least 1".to_string());
        }

        let valid_size = self
            .size
            .split_once('x')
            .map(|(w, h)| w.parse::<u32>().is_ok() && h.parse::<u32>().is_ok())
            .unwrap_or(false);
        if !valid_size {
            return Err(format!(
                "Invalid image size: {} (expected <width>x<height>)",
                self.size
            ));
        }

        Ok(())
    }

    /// Base URL the client should talk to.
    pub fn base_url(&self) -> Result<String, ApiError> {
        match (self.provider_type, self.normalized_endpoint()) {
            (_, Some(endpoint)) => Ok(endpoint),
            (ProviderType::OpenAI, None) => Ok(OPENAI_DEFAULT_ENDPOINT.to_string()),
            (ProviderType::LocalCustom, None) => Err(ApiError::ProviderNotConfigured(
                "LocalCustom provider requires endpoint".to_string(),
            )),
        }
    }

    /// API key from config, then from `OPENAI_API_KEY`.
    pub fn resolve_api_key(&self) -> Result<Option<String>, ApiError> {
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(OPENAI_API_KEY_ENV).ok().filter(|k| !k.is_empty()));
        match (self.provider_type, api_key) {
            (ProviderType::OpenAI, None) => Err(ApiError::ProviderNotConfigured(format!(
                "OpenAI API key required (set in config or {} env var)",
                OPENAI_API_KEY_ENV
            ))),
            (_, key) => Ok(key),
        }
    }
}
