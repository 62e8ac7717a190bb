use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use ipaj_db::models::AppointmentRow;
use ipaj_types::api::{CreateAppointmentRequest, CreateAppointmentResponse};
use ipaj_types::models::{Appointment, AppointmentStatus, UserKind};
use ipaj_types::validation::validate_draft;

use crate::error::ApiError;
use crate::middleware::Claims;
use crate::state::{AppState, with_db};

const LIST_LIMIT: u32 = 200;

/// POST /api/agendamentos
pub async fn create_appointment(
    State(state): State<AppState>,
    Json(req): Json<CreateAppointmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = req.draft;
    validate_draft(&draft)?;

    let id = Uuid::new_v4();
    let status = AppointmentStatus::Pending;
    let row = AppointmentRow {
        id: id.to_string(),
        name: draft.name.trim().to_string(),
        email: draft.email.trim().to_string(),
        phone: draft.phone.trim().to_string(),
        preferred_date: draft.preferred_date.trim().to_string(),
        description: draft.description.trim().to_string(),
        status: status.as_str().to_string(),
        created_at: Utc::now().to_rfc3339(),
    };

    with_db(&state, move |db| db.insert_appointment(&row)).await?;
    info!("Appointment {} created", id);

    Ok((StatusCode::CREATED, Json(CreateAppointmentResponse { id, status })))
}

/// GET /api/advogados/agendamentos
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    if claims.kind != UserKind::Lawyer {
        return Err(ApiError::Forbidden);
    }

    let rows = with_db(&state, |db| db.list_appointments(LIST_LIMIT)).await?;
    Ok(Json(rows.into_iter().filter_map(to_appointment).collect()))
}

fn to_appointment(row: AppointmentRow) -> Option<Appointment> {
    let id = match row.id.parse() {
        Ok(id) => id,
        Err(_) => {
            warn!("Skipping appointment with malformed id '{}'", row.id);
            return None;
        }
    };
    let status = AppointmentStatus::parse(&row.status).unwrap_or_else(|| {
        warn!("Appointment {} has unknown status '{}'", row.id, row.status);
        AppointmentStatus::Pending
    });
    let created_at = DateTime::parse_from_rfc3339(&row.created_at)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            warn!("Appointment {} has malformed timestamp '{}'", row.id, row.created_at);
            DateTime::<Utc>::UNIX_EPOCH
        });

    Some(Appointment {
        id,
        name: row.name,
        email: row.email,
        phone: row.phone,
        preferred_date: row.preferred_date,
        description: row.description,
        status,
        created_at,
    })
}
