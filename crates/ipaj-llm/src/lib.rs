pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Single-turn completion: a system instruction plus one user prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
}

/// Anything that can answer a `CompletionRequest`. Implemented by `Provider`
/// and by test doubles.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    fn name(&self) -> &str;
}

/// Configured upstream model backend.
#[derive(Debug, Clone)]
pub enum Provider {
    Gemini(gemini::GeminiConfig),
    OpenAi(openai::OpenAiConfig),
}

impl Provider {
    pub fn gemini(api_key: String, model: String) -> Self {
        Provider::Gemini(gemini::GeminiConfig {
            api_key,
            model,
            base_url: gemini::DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn openai(api_key: String, model: String, base_url: String) -> Self {
        Provider::OpenAi(openai::OpenAiConfig { api_key, model, base_url })
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::Gemini(config) => &config.model,
            Provider::OpenAi(config) => &config.model,
        }
    }
}

/// A `Provider` bound to a shared HTTP client.
pub struct ProviderClient {
    provider: Provider,
    client: Client,
}

impl ProviderClient {
    pub fn new(provider: Provider) -> Self {
        Self { provider, client: Client::new() }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }
}

#[async_trait]
impl Completion for ProviderClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        match &self.provider {
            Provider::Gemini(config) => gemini::complete(&self.client, config, request).await,
            Provider::OpenAi(config) => openai::complete(&self.client, config, request).await,
        }
    }

    fn name(&self) -> &str {
        match &self.provider {
            Provider::Gemini(_) => "gemini",
            Provider::OpenAi(_) => "openai",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Empty response from model")]
    Empty,
}
