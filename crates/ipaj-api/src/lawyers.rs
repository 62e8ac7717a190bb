use axum::{Extension, Json, extract::State};
use tracing::info;

use ipaj_db::models::LawyerRow;
use ipaj_types::api::{UpdateProfileRequest, UpdateSettingsRequest};
use ipaj_types::models::{LawyerProfile, LawyerSettings, UserKind};
use ipaj_types::validation::normalize_intl_phone;

use crate::error::ApiError;
use crate::middleware::Claims;
use crate::state::{AppState, with_db};

fn require_lawyer(claims: &Claims) -> Result<String, ApiError> {
    if claims.kind == UserKind::Lawyer {
        Ok(claims.sub.to_string())
    } else {
        Err(ApiError::Forbidden)
    }
}

async fn load_profile(state: &AppState, uid: String) -> Result<LawyerProfile, ApiError> {
    let row = with_db(state, move |db| db.get_lawyer_profile(&uid))
        .await?
        .ok_or_else(|| ApiError::NotFound("Perfil de advogado não encontrado.".into()))?;
    to_profile(row)
}

fn to_profile(row: LawyerRow) -> Result<LawyerProfile, ApiError> {
    let user_id = row
        .user_id
        .parse()
        .map_err(|_| ApiError::Internal(anyhow::anyhow!("corrupt user id '{}'", row.user_id)))?;

    Ok(LawyerProfile {
        user_id,
        name: row.name,
        email: row.email,
        phone: row.phone,
        nip: row.nip,
        category: row.category,
        specialization: row.specialization,
        profile_pic_url: row.profile_pic_url,
        settings: LawyerSettings {
            language: row.config_language,
            theme: row.config_theme,
            alerts: row.config_alerts,
        },
    })
}

/// GET /api/advogados/me
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<LawyerProfile>, ApiError> {
    let uid = require_lawyer(&claims)?;
    Ok(Json(load_profile(&state, uid).await?))
}

/// PUT /api/advogados/me/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<LawyerProfile>, ApiError> {
    let uid = require_lawyer(&claims)?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("O nome é obrigatório.".into()));
    }
    let phone = match req.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) => Some(normalize_intl_phone(raw).ok_or_else(|| {
            ApiError::Validation("Número de telefone inválido (use +código+número).".into())
        })?),
        None => None,
    };
    let specialization = req.specialization.trim().to_string();
    let picture = req.profile_pic_url.filter(|p| !p.trim().is_empty());

    let write_uid = uid.clone();
    with_db(&state, move |db| {
        db.update_lawyer_profile(
            &write_uid,
            &name,
            phone.as_deref(),
            &specialization,
            picture.as_deref(),
        )
    })
    .await?;
    info!("Lawyer {} updated profile", uid);

    Ok(Json(load_profile(&state, uid).await?))
}

/// PUT /api/advogados/me/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateSettingsRequest>,
) -> Result<Json<LawyerSettings>, ApiError> {
    let uid = require_lawyer(&claims)?;
    let settings = req.settings;
    if settings.language.trim().is_empty() || settings.theme.trim().is_empty() {
        return Err(ApiError::Validation("Idioma e tema são obrigatórios.".into()));
    }

    let stored = settings.clone();
    with_db(&state, move |db| {
        db.update_lawyer_settings(&uid, &stored.language, &stored.theme, stored.alerts)
    })
    .await?;

    Ok(Json(settings))
}
