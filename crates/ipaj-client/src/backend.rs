use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use ipaj_types::api::{
    ChatReply, ChatRequest, CreateAppointmentRequest, CreateAppointmentResponse, ErrorBody,
    GenerateTotpRequest, GenerateTotpResponse, LoginRequest, LoginResponse, RegisterRequest,
    RegisterResponse, VerifyTotpRequest, VerifyTotpResponse,
};
use ipaj_types::models::AppointmentDraft;

use crate::chat_session::ChatBackend;
use crate::enrollment::TotpBackend;
use crate::error::ClientError;
use crate::wizard::AppointmentSink;

pub const DEFAULT_API_URL: &str = "http://localhost:5001";

/// reqwest client for the IPAJ server routes.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl Default for HttpBackend {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client: Client::new(), base_url, token: None }
    }

    /// Attach the JWT returned by login or registration.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!("POST {}", path);
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let resp = check(request.send().await?).await?;
        Ok(resp.json().await?)
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, ClientError> {
        self.post_json("/auth/register", req).await
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ClientError> {
        self.post_json("/auth/login", req).await
    }
}

/// Turn a non-2xx response into `ClientError::Server`, using the `{error}`
/// body when the server sent one.
async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
    };
    Err(ClientError::Server { status: status.as_u16(), message })
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send_chat(&self, message: &str) -> Result<String, ClientError> {
        let reply: ChatReply = self
            .post_json("/chat", &ChatRequest { message: message.to_string() })
            .await?;
        Ok(reply.reply)
    }
}

#[async_trait]
impl AppointmentSink for HttpBackend {
    async fn submit_appointment(
        &self,
        draft: &AppointmentDraft,
    ) -> Result<CreateAppointmentResponse, ClientError> {
        let body = CreateAppointmentRequest { draft: draft.clone() };
        self.post_json("/api/agendamentos", &body).await
    }
}

#[async_trait]
impl TotpBackend for HttpBackend {
    async fn generate_totp(&self, uid: &str, email: &str) -> Result<GenerateTotpResponse, ClientError> {
        let body = GenerateTotpRequest { email: email.to_string(), uid: uid.to_string() };
        self.post_json("/api/generate-totp", &body).await
    }

    async fn verify_totp(&self, uid: &str, code: &str) -> Result<VerifyTotpResponse, ClientError> {
        let body = VerifyTotpRequest { uid: uid.to_string(), code: code.to_string() };
        let resp = self
            .client
            .post(self.url("/api/verify-totp"))
            .json(&body)
            .send()
            .await?;

        // Rejections come back as 4xx with a `{success: false, error}` body
        let status = resp.status();
        match resp.json::<VerifyTotpResponse>().await {
            Ok(outcome) => Ok(outcome),
            Err(_) if status.is_success() => Err(ClientError::Server {
                status: status.as_u16(),
                message: "malformed verification response".into(),
            }),
            Err(_) => Err(ClientError::Server {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("request failed").to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let backend = HttpBackend::new("http://localhost:5001/");
        assert_eq!(backend.url("/chat"), "http://localhost:5001/chat");
        assert_eq!(HttpBackend::default().url("/"), "http://localhost:5001/");
    }

    #[tokio::test]
    async fn unreachable_server_is_an_http_error() {
        let backend = HttpBackend::new("http://127.0.0.1:9");
        let err = backend.send_chat("Olá").await.unwrap_err();
        assert!(matches!(err, ClientError::Http(_)));
    }
}
