//! OCR backend abstraction.
//!
//! Supports multiple OCR backends:
//! - Tesseract: Traditional OCR via command-line (CPU)
//! - Ocrs: Pure Rust OCR engine (CPU, feature `ocr-ocrs`)

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Errors from OCR backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("OCR timed out on page {page} after {}s", .limit.as_secs())]
    Timeout { page: u32, limit: Duration },

    #[error("Recognition engine is closed")]
    EngineClosed,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(String),
}

/// Available OCR backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcrBackendType {
    /// Tesseract OCR via command-line.
    Tesseract,
    /// Pure Rust OCR engine (ocrs crate).
    Ocrs,
}

impl OcrBackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrBackendType::Tesseract => "tesseract",
            OcrBackendType::Ocrs => "ocrs",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tesseract" => Some(OcrBackendType::Tesseract),
            "ocrs" => Some(OcrBackendType::Ocrs),
            _ => None,
        }
    }

    /// Backend types compiled into this build.
    pub fn compiled() -> Vec<Self> {
        let mut types = vec![OcrBackendType::Tesseract];
        if cfg!(feature = "ocr-ocrs") {
            types.push(OcrBackendType::Ocrs);
        }
        types
    }
}

impl std::fmt::Display for OcrBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for OCR backends.
///
/// `run_ocr` is synchronous and runs on a blocking thread. Backends that
/// shell out also expose `ocr_command`; the engine then runs that command as
/// a child process it can kill on timeout or cancellation.
pub trait OcrBackend: Send + Sync {
    /// Get the backend type.
    fn backend_type(&self) -> OcrBackendType;

    /// Check if this backend is available (dependencies installed, models present).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Core OCR: extract text from an image file.
    fn run_ocr(&self, image_path: &Path) -> Result<String, OcrError>;

    /// The command that prints this image's text on stdout, if recognition
    /// happens in an external program.
    fn ocr_command(&self, _image_path: &Path) -> Option<tokio::process::Command> {
        None
    }

    /// Load models or other heavy state ahead of the first page.
    fn warm_up(&self) -> Result<(), OcrError> {
        Ok(())
    }

    /// Drop whatever `warm_up` loaded.
    fn release(&self) {}
}

/// Configuration for OCR backends (language, model paths).
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Language for OCR (e.g., "eng", "deu").
    pub language: String,
    /// Path to model files (for backends that need them).
    pub model_path: Option<PathBuf>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            model_path: None,
        }
    }
}

/// Construct a backend of the given type.
pub fn create_backend(
    backend_type: OcrBackendType,
    config: OcrConfig,
) -> Result<Arc<dyn OcrBackend>, OcrError> {
    match backend_type {
        OcrBackendType::Tesseract => Ok(Arc::new(super::TesseractBackend::with_config(config))),
        #[cfg(feature = "ocr-ocrs")]
        OcrBackendType::Ocrs => Ok(Arc::new(super::OcrsBackend::with_config(config))),
        #[cfg(not(feature = "ocr-ocrs"))]
        OcrBackendType::Ocrs => Err(OcrError::BackendNotAvailable(
            "ocrs support not compiled in (rebuild with --features ocr-ocrs)".to_string(),
        )),
    }
}
