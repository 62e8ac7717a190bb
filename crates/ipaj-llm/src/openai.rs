use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CompletionRequest, LlmError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage>,
}

#[derive(Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

fn build_request<'a>(config: &'a OpenAiConfig, request: &CompletionRequest) -> OpenAiRequest<'a> {
    OpenAiRequest {
        model: &config.model,
        messages: vec![
            OpenAiMessage { role: "system".into(), content: Some(request.system.clone()) },
            OpenAiMessage { role: "user".into(), content: Some(request.prompt.clone()) },
        ],
    }
}

pub async fn complete(
    client: &Client,
    config: &OpenAiConfig,
    request: &CompletionRequest,
) -> Result<String, LlmError> {
    let body = build_request(config, request);
    debug!(model = %config.model, "openai chat completion");

    let mut req = client
        .post(format!("{}/chat/completions", config.base_url))
        .json(&body);

    if !config.api_key.is_empty() {
        req = req.bearer_auth(&config.api_key);
    }

    let resp = req.send().await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(LlmError::Api { status, message: text });
    }

    let data: OpenAiResponse = resp.json().await?;
    data.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(LlmError::Empty)
}
