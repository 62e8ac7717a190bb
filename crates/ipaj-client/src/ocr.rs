use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::ClientError;

/// An OCR engine. `start` prepares the engine and is called lazily before the
/// first recognition; `shutdown` tears it down.
#[async_trait]
pub trait OcrBackend: Send {
    async fn start(&mut self) -> Result<(), ClientError>;

    async fn recognize(&mut self, path: &Path) -> Result<String, ClientError>;

    fn shutdown(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Unstarted,
    Ready,
}

/// Session-scoped owner of one OCR engine.
///
/// The engine is acquired on first use and released by [`OcrWorker::release`]
/// or when the worker is dropped. Recognition takes `&mut self`, so two
/// overlapping requests can never share the engine.
pub struct OcrWorker<B: OcrBackend> {
    backend: B,
    state: WorkerState,
}

impl<B: OcrBackend> OcrWorker<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, state: WorkerState::Unstarted }
    }

    pub fn is_ready(&self) -> bool {
        self.state == WorkerState::Ready
    }

    pub async fn acquire(&mut self) -> Result<(), ClientError> {
        if self.state == WorkerState::Unstarted {
            self.backend.start().await?;
            self.state = WorkerState::Ready;
            debug!("OCR engine started");
        }
        Ok(())
    }

    pub async fn recognize(&mut self, path: &Path) -> Result<String, ClientError> {
        self.acquire().await?;
        self.backend.recognize(path).await
    }

    pub fn release(&mut self) {
        if self.state == WorkerState::Ready {
            self.backend.shutdown();
            self.state = WorkerState::Unstarted;
            debug!("OCR engine released");
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: OcrBackend> Drop for OcrWorker<B> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Runs the `tesseract` command-line tool and reads the text from stdout.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    language: String,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self { binary: PathBuf::from("tesseract"), language: "por".into() }
    }
}

impl TesseractCli {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self { binary: binary.into(), language: language.into() }
    }
}

#[async_trait]
impl OcrBackend for TesseractCli {
    async fn start(&mut self) -> Result<(), ClientError> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map_err(|e| ClientError::Ocr(format!("cannot run {}: {}", self.binary.display(), e)))?;

        if !output.status.success() {
            return Err(ClientError::Ocr(format!(
                "{} --version exited with {}",
                self.binary.display(),
                output.status
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        info!("Using {}", version.lines().next().unwrap_or("tesseract"));
        Ok(())
    }

    async fn recognize(&mut self, path: &Path) -> Result<String, ClientError> {
        let output = Command::new(&self.binary)
            .arg(path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .await
            .map_err(|e| ClientError::Ocr(format!("cannot run {}: {}", self.binary.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClientError::Ocr(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn shutdown(&mut self) {}
}
