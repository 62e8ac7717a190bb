use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AppointmentDraft, AppointmentStatus, LawyerSettings, Material, MaterialKind, UserKind};

// -- JWT Claims --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub kind: UserKind,
    pub exp: usize,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// -- Auth --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub kind: UserKind,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub nip: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
    pub totp: Option<GenerateTotpResponse>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub name: String,
    pub kind: UserKind,
    pub verified: bool,
    pub token: String,
}

// -- TOTP --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateTotpRequest {
    pub email: String,
    pub uid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateTotpResponse {
    #[serde(rename = "qrCodeUrl")]
    pub qr_code_url: Option<String>,
    pub secret: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyTotpRequest {
    pub uid: String,
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyTotpResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyTotpResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: Some(message.into()), error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, message: None, error: Some(error.into()) }
    }
}

// -- Chat --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

// -- Appointments --

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateAppointmentRequest {
    #[serde(flatten)]
    pub draft: AppointmentDraft,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAppointmentResponse {
    pub id: Uuid,
    pub status: AppointmentStatus,
}

// -- Lawyer dashboard --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub phone: Option<String>,
    pub specialization: String,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateSettingsRequest {
    #[serde(flatten)]
    pub settings: LawyerSettings,
}

// -- Materials --

#[derive(Debug, Default, Deserialize)]
pub struct MaterialsQuery {
    pub categoria: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MaterialResponse {
    pub id: u32,
    pub kind: MaterialKind,
    pub category: &'static str,
    pub title: &'static str,
    pub url: &'static str,
    pub embed_url: String,
    pub thumb: &'static str,
}

impl From<&Material> for MaterialResponse {
    fn from(m: &Material) -> Self {
        Self {
            id: m.id,
            kind: m.kind,
            category: m.category,
            title: m.title,
            url: m.url,
            embed_url: crate::catalog::embed_url(m.url),
            thumb: m.thumb,
        }
    }
}
