//! Client-side session logic for the IPAJ legal assistant: the chat session
//! with document ingestion, the appointment wizard and the 2FA enrollment
//! flow. Remote calls go through small traits so the state machines can be
//! driven by `HttpBackend` or by test doubles.

pub mod backend;
pub mod chat_session;
pub mod enrollment;
pub mod error;
pub mod ocr;
pub mod wizard;

pub use backend::HttpBackend;
pub use chat_session::{ChatBackend, ChatSession, SessionError, SessionState};
pub use enrollment::{EnrollmentError, EnrollmentState, TotpBackend, TotpEnrollment};
pub use error::ClientError;
pub use ocr::{OcrBackend, OcrWorker, TesseractCli};
pub use wizard::{AppointmentSink, SchedulingWizard, SubmitError};
