use thiserror::Error;

/// Failure of a remote call or external capability.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("OCR failed: {0}")]
    Ocr(String),
}
