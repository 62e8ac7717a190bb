/// Database row types — these map directly to SQLite rows.
/// Distinct from ipaj-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub kind: String,
    pub verified: bool,
    pub phone: Option<String>,
    pub nip: Option<String>,
    pub category: Option<String>,
    pub created_at: String,
}

pub struct NewUser<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub kind: &'a str,
    pub verified: bool,
    pub phone: Option<&'a str>,
    pub nip: Option<&'a str>,
    pub category: Option<&'a str>,
}

pub struct TotpRow {
    pub secret: String,
    pub verified: bool,
    pub last_step: Option<u64>,
}

/// `utilizadores` joined with its `advogados` extension.
pub struct LawyerRow {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub nip: Option<String>,
    pub category: Option<String>,
    pub specialization: String,
    pub profile_pic_url: Option<String>,
    pub config_language: String,
    pub config_theme: String,
    pub config_alerts: bool,
}

pub struct AppointmentRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub preferred_date: String,
    pub description: String,
    pub status: String,
    pub created_at: String,
}
