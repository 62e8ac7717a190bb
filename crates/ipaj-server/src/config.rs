use std::path::PathBuf;

use anyhow::Context;
use tracing::warn;

use ipaj_llm::{Provider, gemini, openai};

/// Used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str =
    "ipaj=debug,ipaj_api=debug,ipaj_db=debug,ipaj_llm=debug,ipaj_client=debug,tower_http=debug";

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: Option<String>,
    pub cors_origin: String,
    pub provider: Option<Provider>,
    pub totp_enabled: bool,
    pub mail: Option<MailConfig>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from a variable lookup. Only a malformed port
    /// is fatal; anything else missing just switches a feature off.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = var("IPAJ_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("IPAJ_PORT")
            .unwrap_or_else(|| "5001".into())
            .parse()
            .context("IPAJ_PORT must be a port number")?;
        let db_path: PathBuf = var("IPAJ_DB_PATH").unwrap_or_else(|| "ipaj.db".into()).into();
        let cors_origin = var("IPAJ_CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".into());

        let jwt_secret = match var("IPAJ_JWT_SECRET") {
            Some(secret) if PLACEHOLDER_SECRETS.contains(&secret.as_str()) => {
                warn!("IPAJ_JWT_SECRET is still a placeholder; ignoring it");
                None
            }
            Some(secret) => Some(secret),
            None => {
                warn!("IPAJ_JWT_SECRET is not set");
                None
            }
        };

        let model = var("IPAJ_CHAT_MODEL");
        let provider = if let Some(key) = var("GEMINI_API_KEY") {
            Some(Provider::gemini(key, model.unwrap_or_else(|| gemini::DEFAULT_MODEL.into())))
        } else if let Some(key) = var("OPENAI_API_KEY") {
            Some(Provider::openai(
                key,
                model.unwrap_or_else(|| openai::DEFAULT_MODEL.into()),
                var("OPENAI_BASE_URL").unwrap_or_else(|| openai::DEFAULT_BASE_URL.into()),
            ))
        } else {
            warn!("Neither GEMINI_API_KEY nor OPENAI_API_KEY is set");
            None
        };

        let totp_enabled = match var("IPAJ_ENABLE_2FA").as_deref() {
            None => true,
            Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"),
        };

        let mail = match (var("RESEND_API_KEY"), var("IPAJ_MAIL_FROM")) {
            (Some(api_key), Some(from)) => Some(MailConfig { api_key, from }),
            (Some(_), None) => {
                warn!("RESEND_API_KEY set without IPAJ_MAIL_FROM; mail disabled");
                None
            }
            _ => None,
        };

        Ok(Self {
            host,
            port,
            db_path,
            jwt_secret,
            cors_origin,
            provider,
            totp_enabled,
            mail,
        })
    }
}
