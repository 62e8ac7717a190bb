use axum::{Json, extract::State};
use tracing::{debug, error, warn};
use uuid::Uuid;

use ipaj_llm::CompletionRequest;
use ipaj_types::api::{ChatReply, ChatRequest};
use ipaj_types::envelope::DocumentEnvelope;

use crate::error::ApiError;
use crate::state::{AppState, Feature, with_db};

pub const SYSTEM_PROMPT: &str = "Você é um Assistente Jurídico Virtual. Sua função é analisar textos de documentos, \
responder a questões legais e fornecer resumos informativos. Responda de forma profissional, objetiva e use a \
língua portuguesa. Se o utilizador enviar um documento, comece seu resumo com \"Análise do Documento:\".";

/// POST /chat
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    state.require(Feature::Chat)?;
    let completion = state
        .completion
        .clone()
        .ok_or(ApiError::Unavailable(Feature::Chat.name()))?;

    let envelope = DocumentEnvelope::decode(&req.message);
    if envelope.question.trim().is_empty() && !envelope.has_context() {
        return Err(ApiError::Validation("A mensagem não pode estar vazia.".into()));
    }
    debug!(
        provider = completion.name(),
        has_document = envelope.has_context(),
        "Forwarding chat message"
    );

    let request = CompletionRequest {
        system: SYSTEM_PROMPT.to_string(),
        prompt: envelope.render_for_model(),
    };
    let reply = completion.complete(&request).await.map_err(|e| {
        error!("Completion via {} failed: {}", completion.name(), e);
        ApiError::Upstream(format!("Erro ao obter resposta do chatbot: {}", e))
    })?;

    if state.capabilities.store {
        let id = Uuid::new_v4().to_string();
        let question = envelope.question.clone();
        let has_document = envelope.has_context();
        let logged = reply.clone();
        if let Err(e) = with_db(&state, move |db| {
            db.insert_chat_log(&id, &question, has_document, &logged)
        })
        .await
        {
            warn!("Failed to record chat log: {}", e);
        }
    }

    Ok(Json(ChatReply { reply }))
}
