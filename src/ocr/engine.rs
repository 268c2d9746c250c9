//! Recognition engine: an owned, reusable OCR backend with explicit lifecycle.
//!
//! The engine is built once and handed to `TextExtractor`. It is opened on
//! first use (or explicitly), stays warm across pages and extraction calls,
//! and is released by `close()`. A mutex serializes concurrent callers.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::process::Command;
use tokio::sync::Mutex;

use super::backend::{OcrBackend, OcrBackendType, OcrError};
use super::extractor::ExtractionFault;
use super::text_layer::PaginatedDocument;

/// PDF user-space units per inch; a 1x render.
const BASE_DPI: f32 = 72.0;

/// Settings for page recognition.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Render scale relative to 72 DPI.
    pub render_scale: f32,
    /// Upper bound for rendering plus recognizing one page.
    pub page_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            render_scale: 1.0,
            page_timeout: Duration::from_secs(120),
        }
    }
}

impl EngineConfig {
    pub fn render_dpi(&self) -> u32 {
        (BASE_DPI * self.render_scale).round().max(1.0) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Idle,
    Open,
}

pub struct RecognitionEngine {
    backend: Arc<dyn OcrBackend>,
    config: EngineConfig,
    state: Mutex<EngineState>,
}

impl RecognitionEngine {
    pub fn new(backend: Arc<dyn OcrBackend>, config: EngineConfig) -> Self {
        Self {
            backend,
            config,
            state: Mutex::new(EngineState::Idle),
        }
    }

    pub fn backend_type(&self) -> OcrBackendType {
        self.backend.backend_type()
    }

    pub async fn is_open(&self) -> bool {
        *self.state.lock().await == EngineState::Open
    }

    /// Verify the backend and load its models. Idempotent.
    pub async fn open(&self) -> Result<(), OcrError> {
        let mut state = self.state.lock().await;
        self.open_locked(&mut state).await
    }

    async fn open_locked(&self, state: &mut EngineState) -> Result<(), OcrError> {
        if *state == EngineState::Open {
            return Ok(());
        }
        if !self.backend.is_available() {
            return Err(OcrError::BackendNotAvailable(self.backend.availability_hint()));
        }

        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || backend.warm_up())
            .await
            .map_err(|e| OcrError::OcrFailed(format!("warm-up task failed: {}", e)))??;

        tracing::info!("Opened {} recognition engine", self.backend.backend_type());
        *state = EngineState::Open;
        Ok(())
    }

    /// Release backend resources. The engine may be opened again later.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if *state == EngineState::Open {
            self.backend.release();
            *state = EngineState::Idle;
            tracing::debug!("Closed {} recognition engine", self.backend.backend_type());
        }
    }

    /// Render one page and recognize its text.
    ///
    /// Fails with `EngineClosed` if the engine has not been opened.
    pub async fn recognize_page(
        &self,
        document: &dyn PaginatedDocument,
        page: u32,
    ) -> Result<String, ExtractionFault> {
        let state = self.state.lock().await;
        if *state != EngineState::Open {
            return Err(OcrError::EngineClosed.into());
        }
        self.recognize_locked(&state, document, page).await
    }

    /// Open the engine if needed, then recognize one page under the same
    /// guard, so a queued `close()` cannot land in between.
    pub(crate) async fn recognize_page_lazily(
        &self,
        document: &dyn PaginatedDocument,
        page: u32,
    ) -> Result<String, ExtractionFault> {
        let mut state = self.state.lock().await;
        self.open_locked(&mut state).await?;
        self.recognize_locked(&state, document, page).await
    }

    /// Caller holds the state lock with the engine open.
    async fn recognize_locked(
        &self,
        state: &EngineState,
        document: &dyn PaginatedDocument,
        page: u32,
    ) -> Result<String, ExtractionFault> {
        debug_assert_eq!(*state, EngineState::Open);
        let limit = self.config.page_timeout;
        match tokio::time::timeout(limit, self.render_and_recognize(document, page)).await {
            Ok(result) => result,
            Err(_) => Err(OcrError::Timeout { page, limit }.into()),
        }
    }

    async fn render_and_recognize(
        &self,
        document: &dyn PaginatedDocument,
        page: u32,
    ) -> Result<String, ExtractionFault> {
        let temp_dir = TempDir::new()?;
        let image_path = document
            .render_page(page, self.config.render_dpi(), temp_dir.path())
            .await?;

        let text = match self.backend.ocr_command(&image_path) {
            Some(command) => self.run_command(command).await?,
            None => {
                let backend = Arc::clone(&self.backend);
                tokio::task::spawn_blocking(move || backend.run_ocr(&image_path))
                    .await
                    .map_err(|e| OcrError::OcrFailed(format!("recognition task failed: {}", e)))??
            }
        };

        tracing::debug!("Recognized {} chars on page {}", text.len(), page);
        Ok(text)
    }

    /// Run an external recognizer; the child is killed if this future is dropped.
    async fn run_command(&self, mut command: Command) -> Result<String, OcrError> {
        command.kill_on_drop(true);
        match command.output().await {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => Err(OcrError::OcrFailed(format!(
                "{} failed: {}",
                self.backend.backend_type(),
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OcrError::BackendNotAvailable(self.backend.availability_hint()))
            }
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}
