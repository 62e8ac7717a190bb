use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Outbound mail. Delivery is best-effort for every caller.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> anyhow::Result<()>;
}

/// Resend API configuration
pub struct ResendMailer {
    client: Client,
    api_key: String,
    from_address: String,
}

#[derive(Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

impl ResendMailer {
    pub fn new(api_key: String, from_address: String) -> Self {
        Self { client: Client::new(), api_key, from_address }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &Email) -> anyhow::Result<()> {
        let payload = ResendPayload {
            from: &self.from_address,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };

        let resp = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Resend error ({}): {}", status, body);
        }

        info!("Email sent via Resend to {}", email.to);
        Ok(())
    }
}

/// Message delivering a freshly issued 2FA secret.
pub fn totp_secret_email(to: &str, secret: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "IPAJ - A sua chave de segurança 2FA".to_string(),
        html: format!(
            "<p>Registo de advogado concluído.</p>\
             <p>Adicione esta chave à sua aplicação autenticadora:</p>\
             <p><code>{}</code></p>\
             <p>Depois introduza o código de 6 dígitos para concluir a verificação.</p>",
            secret
        ),
        text: format!(
            "Registo de advogado concluído.\n\nChave 2FA: {}\n\nIntroduza o código de 6 dígitos da sua aplicação autenticadora para concluir a verificação.",
            secret
        ),
    }
}
