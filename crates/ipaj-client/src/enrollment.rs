use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use ipaj_types::api::{GenerateTotpResponse, VerifyTotpResponse};
use ipaj_types::validation::is_totp_code;

use crate::error::ClientError;

/// Server half of the 2FA flow (`/api/generate-totp`, `/api/verify-totp`).
#[async_trait]
pub trait TotpBackend: Send + Sync {
    async fn generate_totp(&self, uid: &str, email: &str) -> Result<GenerateTotpResponse, ClientError>;

    async fn verify_totp(&self, uid: &str, code: &str) -> Result<VerifyTotpResponse, ClientError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentState {
    Registered,
    SecretIssued {
        secret: String,
        qr_code_url: Option<String>,
    },
    Verified,
}

#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("O código do autenticador deve ter 6 dígitos.")]
    MalformedCode,

    #[error("Ainda não foi emitida uma chave 2FA.")]
    NoSecret,

    #[error("A verificação 2FA já foi concluída.")]
    AlreadyVerified,

    #[error("Erro ao verificar código: {0}")]
    Rejected(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Client side of a lawyer's second-factor enrollment:
/// `Registered -> SecretIssued -> Verified`.
pub struct TotpEnrollment {
    uid: String,
    email: String,
    state: EnrollmentState,
}

impl TotpEnrollment {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self { uid: uid.into(), email: email.into(), state: EnrollmentState::Registered }
    }

    /// Resume from a registration response, which may already carry a secret.
    pub fn from_registration(
        uid: impl Into<String>,
        email: impl Into<String>,
        issued: Option<GenerateTotpResponse>,
    ) -> Self {
        let mut enrollment = Self::new(uid, email);
        if let Some(issued) = issued {
            enrollment.accept(issued);
        }
        enrollment
    }

    pub fn state(&self) -> &EnrollmentState {
        &self.state
    }

    pub fn is_verified(&self) -> bool {
        self.state == EnrollmentState::Verified
    }

    fn accept(&mut self, issued: GenerateTotpResponse) {
        if issued.qr_code_url.is_none() {
            warn!("No QR code for {}; showing the secret only", self.uid);
        }
        self.state = EnrollmentState::SecretIssued {
            secret: issued.secret,
            qr_code_url: issued.qr_code_url,
        };
    }

    /// Ask the server for a (new) secret. Any previous secret stops working.
    pub async fn request_secret<B: TotpBackend + ?Sized>(&mut self, backend: &B) -> Result<(), EnrollmentError> {
        if self.is_verified() {
            return Err(EnrollmentError::AlreadyVerified);
        }
        let issued = backend.generate_totp(&self.uid, &self.email).await?;
        self.accept(issued);
        Ok(())
    }

    /// Check a 6-digit code. A rejected code leaves the state unchanged.
    pub async fn submit_code<B: TotpBackend + ?Sized>(
        &mut self,
        backend: &B,
        code: &str,
    ) -> Result<(), EnrollmentError> {
        match self.state {
            EnrollmentState::Registered => return Err(EnrollmentError::NoSecret),
            EnrollmentState::Verified => return Err(EnrollmentError::AlreadyVerified),
            EnrollmentState::SecretIssued { .. } => {}
        }

        let code = code.trim();
        if !is_totp_code(code) {
            return Err(EnrollmentError::MalformedCode);
        }

        let outcome = backend.verify_totp(&self.uid, code).await?;
        if outcome.success {
            info!("2FA verified for {}", self.uid);
            self.state = EnrollmentState::Verified;
            Ok(())
        } else {
            let reason = outcome
                .error
                .unwrap_or_else(|| "Código inválido ou expirado.".to_string());
            Err(EnrollmentError::Rejected(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    /// Accepts exactly one code, once.
    struct OneShot {
        code: &'static str,
        used: Mutex<bool>,
        issued: Mutex<u32>,
    }

    impl OneShot {
        fn new(code: &'static str) -> Self {
            Self { code, used: Mutex::new(false), issued: Mutex::new(0) }
        }
    }

    #[async_trait]
    impl TotpBackend for OneShot {
        async fn generate_totp(&self, _uid: &str, _email: &str) -> Result<GenerateTotpResponse, ClientError> {
            let mut issued = self.issued.lock().unwrap();
            *issued += 1;
            Ok(GenerateTotpResponse { qr_code_url: None, secret: format!("SECRET{}", issued) })
        }

        async fn verify_totp(&self, _uid: &str, code: &str) -> Result<VerifyTotpResponse, ClientError> {
            let mut used = self.used.lock().unwrap();
            if code == self.code && !*used {
                *used = true;
                Ok(VerifyTotpResponse::ok("ok"))
            } else {
                Ok(VerifyTotpResponse::failed("Código inválido ou expirado."))
            }
        }
    }

    #[tokio::test]
    async fn happy_path_reaches_verified() {
        let backend = OneShot::new("123456");
        let mut flow = TotpEnrollment::new("uid-1", "dra@ordem.mz");
        assert_eq!(flow.state(), &EnrollmentState::Registered);
        assert!(matches!(flow.submit_code(&backend, "123456").await, Err(EnrollmentError::NoSecret)));

        flow.request_secret(&backend).await.unwrap();
        assert!(matches!(flow.state(), EnrollmentState::SecretIssued { secret, .. } if secret == "SECRET1"));

        flow.submit_code(&backend, " 123456 ").await.unwrap();
        assert!(flow.is_verified());
        assert!(matches!(flow.request_secret(&backend).await, Err(EnrollmentError::AlreadyVerified)));
    }

    #[tokio::test]
    async fn malformed_code_never_reaches_the_server() {
        let backend = OneShot::new("123456");
        let issued = GenerateTotpResponse { qr_code_url: None, secret: "S".into() };
        let mut flow = TotpEnrollment::from_registration("uid-1", "dra@ordem.mz", Some(issued));

        assert!(matches!(flow.submit_code(&backend, "12345").await, Err(EnrollmentError::MalformedCode)));
        assert!(matches!(flow.submit_code(&backend, "12a456").await, Err(EnrollmentError::MalformedCode)));
        assert!(!*backend.used.lock().unwrap());
    }

    #[tokio::test]
    async fn rejected_code_keeps_secret_issued() {
        let backend = OneShot::new("123456");
        let mut flow = TotpEnrollment::new("uid-1", "dra@ordem.mz");
        flow.request_secret(&backend).await.unwrap();

        let err = flow.submit_code(&backend, "654321").await.unwrap_err();
        assert!(matches!(err, EnrollmentError::Rejected(_)));
        assert!(matches!(flow.state(), EnrollmentState::SecretIssued { .. }));

        flow.request_secret(&backend).await.unwrap();
        assert!(matches!(flow.state(), EnrollmentState::SecretIssued { secret, .. } if secret == "SECRET2"));
    }
}
