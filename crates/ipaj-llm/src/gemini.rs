use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CompletionRequest, LlmError};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

fn build_request(request: &CompletionRequest) -> GeminiRequest {
    GeminiRequest {
        system_instruction: GeminiContent {
            role: None,
            parts: vec![GeminiPart { text: request.system.clone() }],
        },
        contents: vec![GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart { text: request.prompt.clone() }],
        }],
    }
}

/// Concatenated text of the first candidate.
fn extract_text(response: GeminiResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().map(|p| p.text).collect();
    if text.trim().is_empty() { None } else { Some(text) }
}

pub async fn complete(
    client: &Client,
    config: &GeminiConfig,
    request: &CompletionRequest,
) -> Result<String, LlmError> {
    let body = build_request(request);
    let url = format!("{}/models/{}:generateContent", config.base_url, config.model);
    debug!(model = %config.model, "gemini generateContent");

    let resp = client
        .post(url)
        .header("x-goog-api-key", &config.api_key)
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(LlmError::Api { status, message: text });
    }

    let data: GeminiResponse = resp.json().await?;
    extract_text(data).ok_or(LlmError::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_system_instruction() {
        let body = build_request(&CompletionRequest {
            system: "Assistente".into(),
            prompt: "Olá".into(),
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Assistente");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Olá");
    }

    #[test]
    fn text_is_joined_across_parts() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Análise "},{"text":"do Documento"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).as_deref(), Some("Análise do Documento"));
    }

    #[test]
    fn blocked_response_is_empty() {
        let response: GeminiResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(extract_text(response).is_none());
        let response: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(extract_text(response).is_none());
    }
}
