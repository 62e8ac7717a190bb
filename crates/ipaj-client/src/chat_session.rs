use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use ipaj_types::envelope::DocumentEnvelope;
use ipaj_types::models::{ConversationTurn, ImageRef};

use crate::error::ClientError;
use crate::ocr::{OcrBackend, OcrWorker};

pub const GENERATING: &str = "A gerar resposta...";
pub const PROCESSING: &str = "...";
pub const APOLOGY: &str = "Desculpe, ocorreu um erro ao contactar o servidor.";
pub const OCR_FAILED: &str = "Erro ao processar a imagem.";
pub const IMAGE_SENT: &str = "Imagem enviada";
pub const ASK_QUESTION: &str = "Qual é a sua pergunta sobre este documento?";

const PREVIEW_CHARS: usize = 200;

/// Remote completion endpoint (`POST /chat`).
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_chat(&self, message: &str) -> Result<String, ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("empty message")]
    EmptyInput,

    #[error("a request is already in flight")]
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingReply,
    Extracting,
}

/// Outgoing chat message produced by [`ChatSession::begin_text`].
#[derive(Debug)]
#[must_use]
pub struct PendingReply {
    epoch: u64,
    pub message: String,
}

/// Ticket for an OCR run started by [`ChatSession::begin_document`].
#[derive(Debug)]
#[must_use]
pub struct PendingExtraction {
    epoch: u64,
}

/// One chat conversation.
///
/// Each `begin_*` call moves the session out of `Idle` and hands back a
/// ticket; the matching `complete_*` call applies the result and returns to
/// `Idle`. A second `begin_*` while a ticket is outstanding fails with
/// [`SessionError::Busy`]. [`ChatSession::clear`] invalidates outstanding
/// tickets, so a reply arriving after a clear is discarded.
pub struct ChatSession<C: ChatBackend, O: OcrBackend> {
    backend: C,
    ocr: OcrWorker<O>,
    turns: Vec<ConversationTurn>,
    pending_document: Option<String>,
    state: SessionState,
    epoch: u64,
}

impl<C: ChatBackend, O: OcrBackend> ChatSession<C, O> {
    pub fn new(backend: C, ocr: O) -> Self {
        Self {
            backend,
            ocr: OcrWorker::new(ocr),
            turns: Vec::new(),
            pending_document: None,
            state: SessionState::Idle,
            epoch: 0,
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn pending_document(&self) -> Option<&str> {
        self.pending_document.as_deref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn ocr(&self) -> &OcrWorker<O> {
        &self.ocr
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.state == SessionState::Idle {
            Ok(())
        } else {
            Err(SessionError::Busy)
        }
    }

    fn drop_transient(&mut self) {
        self.turns.retain(|turn| !turn.transient);
    }

    /// Record the user's question and build the wire message. A pending
    /// document is consumed here.
    pub fn begin_text(&mut self, input: &str) -> Result<PendingReply, SessionError> {
        if input.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }
        self.ensure_idle()?;

        self.turns.push(ConversationTurn::user(input));
        self.turns.push(ConversationTurn::placeholder(GENERATING));

        let envelope = match self.pending_document.take() {
            Some(document) => DocumentEnvelope::with_context(document, input),
            None => DocumentEnvelope::question(input),
        };
        self.state = SessionState::AwaitingReply;

        Ok(PendingReply { epoch: self.epoch, message: envelope.encode() })
    }

    /// Apply the completion result. Returns `false` if the ticket was
    /// invalidated by `clear()`.
    pub fn complete_text(&mut self, pending: PendingReply, result: Result<String, ClientError>) -> bool {
        if pending.epoch != self.epoch {
            debug!("Dropping reply for a cleared conversation");
            return false;
        }

        self.drop_transient();
        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Chat request failed: {}", e);
                APOLOGY.to_string()
            }
        };
        self.turns.push(ConversationTurn::bot(reply));
        self.state = SessionState::Idle;
        true
    }

    pub fn begin_document(&mut self, image: ImageRef) -> Result<PendingExtraction, SessionError> {
        self.ensure_idle()?;

        self.turns.push(ConversationTurn::user_image(IMAGE_SENT, image));
        self.turns.push(ConversationTurn::placeholder(PROCESSING));
        self.state = SessionState::Extracting;

        Ok(PendingExtraction { epoch: self.epoch })
    }

    /// Apply the OCR result: on success the text becomes the pending
    /// document and a preview is shown. Returns `false` for a stale ticket.
    pub fn complete_document(
        &mut self,
        pending: PendingExtraction,
        result: Result<String, ClientError>,
    ) -> bool {
        if pending.epoch != self.epoch {
            debug!("Dropping OCR result for a cleared conversation");
            return false;
        }

        self.drop_transient();
        match result {
            Ok(text) if !text.trim().is_empty() => {
                self.turns.push(ConversationTurn::bot(preview(&text)));
                self.pending_document = Some(text);
            }
            Ok(_) => {
                warn!("OCR produced no text");
                self.turns.push(ConversationTurn::bot(OCR_FAILED));
            }
            Err(e) => {
                warn!("OCR failed: {}", e);
                self.turns.push(ConversationTurn::bot(OCR_FAILED));
            }
        }
        self.state = SessionState::Idle;
        true
    }

    /// Send one question and wait for the reply. Upstream failures end up
    /// as an apology turn, not as an error.
    pub async fn submit_text(&mut self, input: &str) -> Result<(), SessionError> {
        let pending = self.begin_text(input)?;
        let result = self.backend.send_chat(&pending.message).await;
        self.complete_text(pending, result);
        Ok(())
    }

    /// Extract text from an image with the session's OCR engine. The chat
    /// endpoint is not called.
    pub async fn submit_document(&mut self, path: &Path) -> Result<(), SessionError> {
        let image = ImageRef {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.display().to_string(),
        };
        let pending = self.begin_document(image)?;
        let result = self.ocr.recognize(path).await;
        self.complete_document(pending, result);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.pending_document = None;
        self.state = SessionState::Idle;
        self.epoch += 1;
    }

    /// Tear down the session, releasing the OCR engine.
    pub fn close(mut self) {
        self.ocr.release();
    }
}

fn preview(text: &str) -> String {
    let mut summary: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        summary.push_str("...");
    }
    format!("Texto extraído: {}\n\n{}", summary, ASK_QUESTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ipaj_types::envelope::{CONTEXT_CLOSE, CONTEXT_OPEN};
    use ipaj_types::models::Sender;

    #[derive(Clone, Default)]
    struct FakeChat {
        fail: bool,
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ChatBackend for FakeChat {
        async fn send_chat(&self, message: &str) -> Result<String, ClientError> {
            self.sent.lock().unwrap().push(message.to_string());
            if self.fail {
                Err(ClientError::Server { status: 500, message: "boom".into() })
            } else {
                Ok(format!("resposta {}", self.sent.lock().unwrap().len()))
            }
        }
    }

    #[derive(Clone, Default)]
    struct FakeOcr {
        text: Option<String>,
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl OcrBackend for FakeOcr {
        async fn start(&mut self) -> Result<(), ClientError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn recognize(&mut self, _path: &Path) -> Result<String, ClientError> {
            self.text.clone().ok_or_else(|| ClientError::Ocr("unreadable".into()))
        }

        fn shutdown(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn ocr_with(text: &str) -> FakeOcr {
        FakeOcr { text: Some(text.into()), ..Default::default() }
    }

    fn session(chat: FakeChat, ocr: FakeOcr) -> ChatSession<FakeChat, FakeOcr> {
        ChatSession::new(chat, ocr)
    }

    #[tokio::test]
    async fn text_turn_leaves_one_user_and_one_bot_turn() {
        let chat = FakeChat::default();
        let mut s = session(chat.clone(), FakeOcr::default());

        s.submit_text("O que é um contrato?").await.unwrap();

        assert_eq!(s.turns().len(), 2);
        assert_eq!(s.turns()[0].sender, Sender::User);
        assert_eq!(s.turns()[1].sender, Sender::Bot);
        assert!(s.turns().iter().all(|t| !t.transient));
        assert_eq!(chat.sent.lock().unwrap()[0], "O que é um contrato?");
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let chat = FakeChat::default();
        let mut s = session(chat.clone(), FakeOcr::default());

        assert_eq!(s.submit_text("   \n").await, Err(SessionError::EmptyInput));
        assert!(s.turns().is_empty());
        assert!(chat.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_becomes_apology() {
        let chat = FakeChat { fail: true, ..Default::default() };
        let mut s = session(chat, FakeOcr::default());

        s.submit_text("Olá").await.unwrap();

        assert_eq!(s.turns().len(), 2);
        assert_eq!(s.turns()[1].text, APOLOGY);
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn document_is_embedded_once() {
        let chat = FakeChat::default();
        let mut s = session(chat.clone(), ocr_with("Contrato de arrendamento n.º 12"));

        s.submit_document(Path::new("/tmp/contrato.png")).await.unwrap();
        assert_eq!(s.pending_document(), Some("Contrato de arrendamento n.º 12"));
        assert!(chat.sent.lock().unwrap().is_empty());
        assert_eq!(s.turns()[0].text, IMAGE_SENT);
        assert_eq!(s.turns()[0].image.as_ref().unwrap().name, "contrato.png");
        assert!(s.turns()[1].text.starts_with("Texto extraído: Contrato de arrendamento"));

        s.submit_text("Posso rescindir?").await.unwrap();
        assert!(s.pending_document().is_none());

        s.submit_text("E a caução?").await.unwrap();

        let sent = chat.sent.lock().unwrap();
        assert!(sent[0].starts_with(CONTEXT_OPEN));
        assert!(sent[0].contains("Contrato de arrendamento n.º 12"));
        assert!(sent[0].contains(CONTEXT_CLOSE));
        assert!(sent[0].ends_with("Posso rescindir?"));
        assert_eq!(sent[1], "E a caução?");
    }

    #[tokio::test]
    async fn quoted_ocr_text_is_sent_unchanged() {
        let ocr = "Cláusula 3: o \"Arrendatário\" paga C:\\docs";
        let chat = FakeChat::default();
        let mut s = session(chat.clone(), ocr_with(ocr));

        s.submit_document(Path::new("clausula.png")).await.unwrap();
        s.submit_text("Quem paga?").await.unwrap();

        let sent = chat.sent.lock().unwrap();
        assert!(sent[0].contains(ocr), "{}", sent[0]);
        assert_eq!(DocumentEnvelope::decode(&sent[0]).context.as_deref(), Some(ocr));
    }

    #[tokio::test]
    async fn ocr_failure_does_not_call_chat() {
        let chat = FakeChat::default();
        let mut s = session(chat.clone(), FakeOcr::default());

        s.submit_document(Path::new("scan.png")).await.unwrap();

        assert_eq!(s.turns().len(), 2);
        assert_eq!(s.turns()[1].text, OCR_FAILED);
        assert!(s.pending_document().is_none());
        assert!(chat.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn preview_is_truncated() {
        let long = "a".repeat(250);
        let text = preview(&long);
        assert!(text.starts_with(&format!("Texto extraído: {}...", "a".repeat(200))));
        assert!(!preview("curto").contains("..."));
    }

    #[test]
    fn overlapping_requests_are_rejected() {
        let mut s = session(FakeChat::default(), FakeOcr::default());

        let pending = s.begin_text("primeira").unwrap();
        assert_eq!(s.state(), SessionState::AwaitingReply);
        assert_eq!(s.begin_text("segunda").unwrap_err(), SessionError::Busy);
        assert_eq!(
            s.begin_document(ImageRef { name: "x.png".into(), path: "x.png".into() }).unwrap_err(),
            SessionError::Busy
        );

        assert!(s.complete_text(pending, Ok("ok".into())));
        assert!(s.begin_text("terceira").is_ok());
    }

    #[test]
    fn clear_discards_late_replies() {
        let mut s = session(FakeChat::default(), FakeOcr::default());

        let pending = s.begin_text("pergunta").unwrap();
        s.clear();
        assert!(!s.complete_text(pending, Ok("tarde".into())));
        assert!(s.turns().is_empty());
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let mut s = session(FakeChat::default(), ocr_with("texto"));
        s.submit_document(Path::new("doc.png")).await.unwrap();
        s.submit_text("pergunta").await.unwrap();
        s.submit_document(Path::new("doc.png")).await.unwrap();

        s.clear();
        assert!(s.turns().is_empty());
        assert!(s.pending_document().is_none());

        s.clear();
        assert!(s.turns().is_empty());
        assert!(s.pending_document().is_none());
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn ocr_engine_is_shared_and_released_on_close() {
        let ocr = ocr_with("texto");
        let mut s = session(FakeChat::default(), ocr.clone());
        assert!(!s.ocr().is_ready());

        s.submit_document(Path::new("a.png")).await.unwrap();
        s.submit_text("?").await.unwrap();
        s.submit_document(Path::new("b.png")).await.unwrap();
        assert_eq!(ocr.starts.load(Ordering::SeqCst), 1);

        s.close();
        assert_eq!(ocr.stops.load(Ordering::SeqCst), 1);
    }
}
