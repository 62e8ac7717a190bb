use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use ipaj_types::api::CreateAppointmentResponse;
use ipaj_types::models::AppointmentDraft;
use ipaj_types::validation::{AppointmentField, ValidationError, validate_draft};

use crate::error::ClientError;

pub const FIRST_STEP: u8 = 1;
pub const LAST_STEP: u8 = 5;

pub const SUBMITTED: &str = "Atendimento agendado com sucesso! Um email de confirmação será enviado.";
pub const SUBMIT_FAILED: &str = "Ocorreu um erro ao agendar. Por favor, verifique a sua conexão e tente novamente.";

/// Where finished drafts are stored (`POST /api/agendamentos`).
#[async_trait]
pub trait AppointmentSink: Send + Sync {
    async fn submit_appointment(
        &self,
        draft: &AppointmentDraft,
    ) -> Result<CreateAppointmentResponse, ClientError>;
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Ocorreu um erro ao agendar. Por favor, verifique a sua conexão e tente novamente.")]
    Upstream(#[source] ClientError),
}

/// Five-step appointment form. Each of steps 1 to 4 guards one field on the
/// way forward; the description on step 5 is checked at submission.
#[derive(Debug, Clone)]
pub struct SchedulingWizard {
    step: u8,
    draft: AppointmentDraft,
    message: Option<String>,
}

impl Default for SchedulingWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulingWizard {
    pub fn new() -> Self {
        Self { step: FIRST_STEP, draft: AppointmentDraft::default(), message: None }
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn draft(&self) -> &AppointmentDraft {
        &self.draft
    }

    /// Last user-facing message (validation failure or submission outcome).
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The field edited on the current step.
    pub fn current_field(&self) -> AppointmentField {
        AppointmentField::for_step(self.step).unwrap_or(AppointmentField::Description)
    }

    pub fn set(&mut self, field: AppointmentField, value: impl Into<String>) {
        let value = value.into();
        match field {
            AppointmentField::Name => self.draft.name = value,
            AppointmentField::Email => self.draft.email = value,
            AppointmentField::Phone => self.draft.phone = value,
            AppointmentField::PreferredDate => self.draft.preferred_date = value,
            AppointmentField::Description => self.draft.description = value,
        }
    }

    /// Advance one step if the current field is valid. On failure the step
    /// is unchanged and the message names the field.
    pub fn validate_and_next(&mut self) -> Result<u8, ValidationError> {
        if self.step >= LAST_STEP {
            return Ok(self.step);
        }

        if let Err(e) = self.current_field().check(&self.draft) {
            self.message = Some(e.to_string());
            return Err(e);
        }

        self.message = None;
        self.step += 1;
        Ok(self.step)
    }

    pub fn handle_back(&mut self) -> u8 {
        if self.step > FIRST_STEP {
            self.step -= 1;
        }
        self.message = None;
        self.step
    }

    /// Validate the whole draft and hand it to `sink`. The draft is kept on
    /// any failure so the user can retry; on success the wizard starts over.
    pub async fn handle_submit<S: AppointmentSink + ?Sized>(
        &mut self,
        sink: &S,
    ) -> Result<CreateAppointmentResponse, SubmitError> {
        if let Err(e) = validate_draft(&self.draft) {
            self.message = Some(e.to_string());
            return Err(e.into());
        }

        match sink.submit_appointment(&self.draft).await {
            Ok(created) => {
                info!("Appointment {} submitted", created.id);
                self.step = FIRST_STEP;
                self.draft = AppointmentDraft::default();
                self.message = Some(SUBMITTED.to_string());
                Ok(created)
            }
            Err(e) => {
                warn!("Appointment submission failed: {}", e);
                self.message = Some(SUBMIT_FAILED.to_string());
                Err(SubmitError::Upstream(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use ipaj_types::models::AppointmentStatus;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingSink {
        fail: bool,
        records: Mutex<Vec<AppointmentDraft>>,
    }

    #[async_trait]
    impl AppointmentSink for RecordingSink {
        async fn submit_appointment(
            &self,
            draft: &AppointmentDraft,
        ) -> Result<CreateAppointmentResponse, ClientError> {
            if self.fail {
                return Err(ClientError::Server { status: 503, message: "store".into() });
            }
            self.records.lock().unwrap().push(draft.clone());
            Ok(CreateAppointmentResponse { id: Uuid::new_v4(), status: AppointmentStatus::Pending })
        }
    }

    fn filled() -> SchedulingWizard {
        let mut w = SchedulingWizard::new();
        w.set(AppointmentField::Name, "Ana");
        w.set(AppointmentField::Email, "a@b.com");
        w.set(AppointmentField::Phone, "812345678");
        w.set(AppointmentField::PreferredDate, "2025-12-01");
        w.set(AppointmentField::Description, "Divórcio");
        w
    }

    #[test]
    fn empty_name_blocks_first_step() {
        let mut w = SchedulingWizard::new();
        let err = w.validate_and_next().unwrap_err();
        assert_eq!(err, ValidationError::Field(AppointmentField::Name));
        assert_eq!(w.step(), 1);
        assert!(w.message().unwrap().contains("Nome"));

        w.set(AppointmentField::Name, "Ana");
        assert_eq!(w.validate_and_next(), Ok(2));
        assert!(w.message().is_none());
    }

    #[test]
    fn each_step_checks_its_own_field() {
        let mut w = SchedulingWizard::new();
        w.set(AppointmentField::Name, "Ana");
        w.validate_and_next().unwrap();

        w.set(AppointmentField::Email, "sem-arroba");
        assert!(w.validate_and_next().is_err());
        w.set(AppointmentField::Email, "a@b.com");
        assert_eq!(w.validate_and_next(), Ok(3));

        w.set(AppointmentField::Phone, " 1234567 ");
        assert!(w.validate_and_next().is_err());
        assert_eq!(w.step(), 3);
    }

    #[test]
    fn back_never_goes_below_first_step() {
        let mut w = filled();
        w.validate_and_next().unwrap();
        assert_eq!(w.handle_back(), 1);
        assert_eq!(w.handle_back(), 1);
    }

    #[test]
    fn last_step_does_not_advance() {
        let mut w = filled();
        for expected in 2..=5 {
            assert_eq!(w.validate_and_next(), Ok(expected));
        }
        assert_eq!(w.validate_and_next(), Ok(5));
        assert_eq!(w.current_field(), AppointmentField::Description);
    }

    #[tokio::test]
    async fn full_walk_submits_one_pending_record() {
        let sink = RecordingSink::default();
        let mut w = filled();
        while w.step() < LAST_STEP {
            w.validate_and_next().unwrap();
        }

        let created = w.handle_submit(&sink).await.unwrap();
        assert_eq!(created.status, AppointmentStatus::Pending);

        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Ana");
        assert_eq!(records[0].description, "Divórcio");
        assert_eq!(w.step(), 1);
        assert_eq!(w.message(), Some(SUBMITTED));
    }

    #[tokio::test]
    async fn missing_description_is_caught_at_submit() {
        let sink = RecordingSink::default();
        let mut w = filled();
        w.set(AppointmentField::Description, "  ");

        let err = w.handle_submit(&sink).await.unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(ValidationError::DescriptionRequired)));
        assert_eq!(w.message(), Some("A descrição é obrigatória para agendar."));
        assert!(sink.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_submission_keeps_the_draft() {
        let sink = RecordingSink { fail: true, ..Default::default() };
        let mut w = filled();
        for _ in 0..4 {
            w.validate_and_next().unwrap();
        }
        let before = w.draft().clone();

        assert!(matches!(w.handle_submit(&sink).await, Err(SubmitError::Upstream(_))));
        assert_eq!(w.draft(), &before);
        assert_eq!(w.step(), 5);
        assert_eq!(w.message(), Some(SUBMIT_FAILED));
    }
}
