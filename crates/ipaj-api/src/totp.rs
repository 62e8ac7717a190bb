use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info, warn};

use ipaj_crypto::keys::generate_secret;
use ipaj_crypto::qr::{otpauth_uri, qr_data_url};
use ipaj_crypto::totp::{self as otp, TotpError};
use ipaj_types::api::{GenerateTotpRequest, GenerateTotpResponse, VerifyTotpRequest, VerifyTotpResponse};
use ipaj_types::validation::is_totp_code;

use crate::error::ApiError;
use crate::mailer::totp_secret_email;
use crate::state::{AppState, Feature, with_db};

/// POST /api/generate-totp
pub async fn generate_totp(
    State(state): State<AppState>,
    Json(req): Json<GenerateTotpRequest>,
) -> Result<Json<GenerateTotpResponse>, ApiError> {
    state.require(Feature::Totp)?;

    if req.uid.trim().is_empty() || !req.email.contains('@') {
        return Err(ApiError::Validation("Email e UID são obrigatórios.".into()));
    }

    let issued = issue_secret(&state, req.uid.trim(), req.email.trim()).await?;
    Ok(Json(issued))
}

/// Create a new secret for `uid`, replacing any previous one, and hand it to
/// the user. QR rendering and the e-mail copy are both best-effort.
pub async fn issue_secret(
    state: &AppState,
    uid: &str,
    email: &str,
) -> Result<GenerateTotpResponse, ApiError> {
    let secret = generate_secret();

    let qr_code_url = match qr_data_url(&otpauth_uri(email, &secret)) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("QR rendering failed for {}: {}", uid, e);
            None
        }
    };

    let stored = {
        let uid = uid.to_string();
        let secret = secret.clone();
        with_db(state, move |db| db.store_totp_secret(&uid, &secret)).await?
    };
    if !stored {
        return Err(ApiError::NotFound("Utilizador não encontrado.".into()));
    }
    info!("TOTP secret issued for {}", uid);

    match &state.mailer {
        Some(mailer) => {
            if let Err(e) = mailer.send(&totp_secret_email(email, &secret)).await {
                warn!("Failed to e-mail TOTP secret to {}: {:#}", email, e);
            }
        }
        None => warn!("Mail not configured; TOTP secret for {} not e-mailed", uid),
    }

    Ok(GenerateTotpResponse { qr_code_url, secret })
}

/// POST /api/verify-totp
pub async fn verify_totp(
    State(state): State<AppState>,
    Json(req): Json<VerifyTotpRequest>,
) -> Response {
    match check_code(&state, req).await {
        Ok(()) => (
            StatusCode::OK,
            Json(VerifyTotpResponse::ok("Verificação 2FA concluída com sucesso.")),
        )
            .into_response(),
        Err(e) => (e.status(), Json(VerifyTotpResponse::failed(e.to_string()))).into_response(),
    }
}

async fn check_code(state: &AppState, req: VerifyTotpRequest) -> Result<(), ApiError> {
    state.require(Feature::Totp)?;

    let code = req.code.trim().to_string();
    if !is_totp_code(&code) {
        return Err(ApiError::Validation("O código do autenticador deve ter 6 dígitos.".into()));
    }

    let uid = req.uid.trim().to_string();
    let lookup_uid = uid.clone();
    let enrollment = with_db(state, move |db| db.get_totp(&lookup_uid))
        .await?
        .ok_or_else(|| ApiError::NotFound("Chave 2FA não encontrada para este utilizador.".into()))?;

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    let step = match otp::verify(&enrollment.secret, &code, now, enrollment.last_step) {
        Ok(Some(step)) => step,
        Ok(None) => {
            warn!("Rejected TOTP code for {}", uid);
            return Err(ApiError::Validation("Código inválido ou expirado.".into()));
        }
        Err(TotpError::MalformedCode) => {
            return Err(ApiError::Validation("O código do autenticador deve ter 6 dígitos.".into()));
        }
        Err(TotpError::InvalidSecret) => {
            error!("Stored TOTP secret for {} is not valid base32", uid);
            return Err(ApiError::Internal(anyhow::anyhow!("corrupt TOTP secret")));
        }
    };

    let mark_uid = uid.clone();
    let secret = enrollment.secret;
    let accepted = with_db(state, move |db| db.mark_totp_verified(&mark_uid, &secret, step)).await?;
    if !accepted {
        warn!("TOTP code for {} was already used", uid);
        return Err(ApiError::Validation("Código inválido ou expirado.".into()));
    }
    info!("TOTP verified for {}", uid);
    Ok(())
}
