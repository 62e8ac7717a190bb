use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info};
use uuid::Uuid;

use ipaj_db::models::NewUser;
use ipaj_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use ipaj_types::models::UserKind;
use ipaj_types::validation::normalize_intl_phone;

use crate::error::ApiError;
use crate::middleware::Claims;
use crate::state::{AppState, Feature, with_db};
use crate::totp::issue_secret;

const MIN_PASSWORD_LEN: usize = 6;

/// Registration data after validation.
struct ValidRegistration {
    name: String,
    email: String,
    password: String,
    kind: UserKind,
    phone: Option<String>,
    nip: Option<String>,
    category: Option<String>,
}

fn validate_registration(req: RegisterRequest) -> Result<ValidRegistration, ApiError> {
    let name = req.name.trim().to_string();
    let email = req.email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "Por favor, preencha todos os campos obrigatórios: Nome, E-mail e Palavra-passe.".into(),
        ));
    }
    if !email.contains('@') {
        return Err(ApiError::Validation("E-mail inválido.".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(
            "A palavra-passe é demasiado fraca (mínimo 6 caracteres).".into(),
        ));
    }

    let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    let (phone, nip, category) = match req.kind {
        UserKind::Citizen => (None, None, None),
        UserKind::Lawyer => {
            let phone = req.phone.as_deref().and_then(normalize_intl_phone);
            let nip = non_empty(req.nip);
            let category = non_empty(req.category);
            match (phone, nip, category) {
                (Some(phone), Some(nip), Some(category)) => (Some(phone), Some(nip), Some(category)),
                _ => {
                    return Err(ApiError::Validation(
                        "Por favor, preencha o NIP, selecione a Categoria e insira o Número de Telefone no formato internacional (+código+número).".into(),
                    ));
                }
            }
        }
    };

    Ok(ValidRegistration {
        name,
        email,
        password: req.password,
        kind: req.kind,
        phone,
        nip,
        category,
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.require(Feature::Auth)?;
    let reg = validate_registration(req)?;

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(reg.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::Internal(anyhow::anyhow!("password hashing failed"))
        })?
        .to_string();

    let user_id = Uuid::new_v4();
    let kind = reg.kind;

    let created = {
        let id = user_id.to_string();
        let email = reg.email.clone();
        with_db(&state, move |db| {
            if db.get_user_by_email(&email)?.is_some() {
                return Ok(false);
            }
            db.create_user(&NewUser {
                id: &id,
                name: &reg.name,
                email: &email,
                password_hash: &password_hash,
                kind: kind.as_str(),
                verified: kind == UserKind::Citizen,
                phone: reg.phone.as_deref(),
                nip: reg.nip.as_deref(),
                category: reg.category.as_deref(),
            })?;
            if kind == UserKind::Lawyer {
                db.create_lawyer_profile(&id)?;
            }
            Ok(true)
        })
        .await?
    };
    if !created {
        return Err(ApiError::Conflict("Este e-mail já está a ser utilizado.".into()));
    }
    info!("Registered {} account {}", kind.as_str(), user_id);

    let totp = if kind == UserKind::Lawyer && state.capabilities.totp {
        match issue_secret(&state, &user_id.to_string(), &reg.email).await {
            Ok(issued) => Some(issued),
            Err(e) => {
                // The account stays; the client can retry via /api/generate-totp
                error!("TOTP issuance failed for {}: {}", user_id, e);
                None
            }
        }
    } else {
        None
    };

    let token = create_token(state.jwt_secret()?, user_id, &reg.email, kind)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, token, totp }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.require(Feature::Auth)?;

    let email = req.email.trim().to_lowercase();
    let user = with_db(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|_| ApiError::Internal(anyhow::anyhow!("stored password hash is invalid")))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|_| ApiError::Internal(anyhow::anyhow!("corrupt user id '{}'", user.id)))?;
    let kind = UserKind::parse(&user.kind)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("unknown user kind '{}'", user.kind)))?;

    let token = create_token(state.jwt_secret()?, user_id, &user.email, kind)?;

    Ok(Json(LoginResponse {
        user_id,
        name: user.name,
        kind,
        verified: user.verified,
        token,
    }))
}

pub fn create_token(secret: &str, user_id: Uuid, email: &str, kind: UserKind) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        kind,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: UserKind) -> RegisterRequest {
        RegisterRequest {
            name: " Jana ".into(),
            email: " Jana@IPAJ.mz ".into(),
            password: "segredo1".into(),
            kind,
            phone: Some("+258 84 123 4567".into()),
            nip: Some("998877".into()),
            category: Some("Advogado Estagiário".into()),
        }
    }

    #[test]
    fn citizen_drops_lawyer_fields() {
        let reg = validate_registration(request(UserKind::Citizen)).unwrap();
        assert_eq!(reg.name, "Jana");
        assert_eq!(reg.email, "jana@ipaj.mz");
        assert!(reg.phone.is_none() && reg.nip.is_none());
    }

    #[test]
    fn lawyer_needs_international_phone() {
        let reg = validate_registration(request(UserKind::Lawyer)).unwrap();
        assert_eq!(reg.phone.as_deref(), Some("+258841234567"));

        let mut req = request(UserKind::Lawyer);
        req.phone = Some("841234567".into());
        assert!(matches!(validate_registration(req), Err(ApiError::Validation(_))));

        let mut req = request(UserKind::Lawyer);
        req.nip = Some("  ".into());
        assert!(matches!(validate_registration(req), Err(ApiError::Validation(_))));
    }

    #[test]
    fn weak_password_is_rejected() {
        let mut req = request(UserKind::Citizen);
        req.password = "12345".into();
        let err = validate_registration(req).err().unwrap();
        assert!(err.to_string().contains("mínimo 6"));
    }
}
