use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Chat --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Reference to an uploaded image shown alongside a user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub name: String,
    pub path: String,
}

/// One entry of a conversation. Transient turns are placeholders
/// ("generating...", "processing...") replaced once the real reply lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub sender: Sender,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub transient: bool,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { sender: Sender::User, text: text.into(), image: None, transient: false }
    }

    pub fn user_image(text: impl Into<String>, image: ImageRef) -> Self {
        Self { sender: Sender::User, text: text.into(), image: Some(image), transient: false }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self { sender: Sender::Bot, text: text.into(), image: None, transient: false }
    }

    pub fn placeholder(text: impl Into<String>) -> Self {
        Self { sender: Sender::Bot, text: text.into(), image: None, transient: true }
    }
}

// -- Appointments --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Pending,
    InProgress,
    Done,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "InProgress",
            Self::Done => "Done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(Self::Pending),
            "InProgress" => Some(Self::InProgress),
            "Done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// Appointment data collected by the scheduling wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub preferred_date: String,
    pub description: String,
}

/// Persisted appointment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub preferred_date: String,
    pub description: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

// -- Users --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    Citizen,
    Lawyer,
}

impl UserKind {
    /// Storage tag used in the `utilizadores` collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Citizen => "comum",
            Self::Lawyer => "advogado",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "comum" => Some(Self::Citizen),
            "advogado" => Some(Self::Lawyer),
            _ => None,
        }
    }
}

/// Second-factor state bound 1:1 to a user. Re-issuing overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotpEnrollment {
    pub secret: String,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawyerSettings {
    pub language: String,
    pub theme: String,
    pub alerts: bool,
}

impl Default for LawyerSettings {
    fn default() -> Self {
        Self {
            language: "Português (Moçambique)".into(),
            theme: "Claro".into(),
            alerts: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LawyerProfile {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub nip: Option<String>,
    pub category: Option<String>,
    pub specialization: String,
    pub profile_pic_url: Option<String>,
    pub settings: LawyerSettings,
}

// -- Materials --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Video,
    Pdf,
}

#[derive(Debug, Clone, Serialize)]
pub struct Material {
    pub id: u32,
    pub kind: MaterialKind,
    pub category: &'static str,
    pub title: &'static str,
    pub url: &'static str,
    pub thumb: &'static str,
}
