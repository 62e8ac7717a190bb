pub mod appointments;
pub mod auth;
pub mod chat;
pub mod error;
pub mod lawyers;
pub mod mailer;
pub mod materials;
pub mod middleware;
pub mod state;
pub mod totp;

use axum::{
    Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post, put},
};

use crate::middleware::require_auth;
use crate::state::AppState;

/// Every HTTP route of the backend. CORS and tracing layers are added by the
/// binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/chat", post(chat::chat))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/api/generate-totp", post(totp::generate_totp))
        .route("/api/verify-totp", post(totp::verify_totp))
        .route("/api/agendamentos", post(appointments::create_appointment))
        .route("/api/materiais", get(materials::list_materials))
        .route("/api/materiais/categorias", get(materials::list_categories))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/advogados/me", get(lawyers::get_profile))
        .route("/api/advogados/me/profile", put(lawyers::update_profile))
        .route("/api/advogados/me/settings", put(lawyers::update_settings))
        .route("/api/advogados/agendamentos", get(appointments::list_appointments))
        .layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

async fn root() -> &'static str {
    "Servidor a funcionar ✅"
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "capabilities": state.capabilities,
    }))
}
