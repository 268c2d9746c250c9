//! OCR and text extraction module.
//!
//! Extracts text from documents using:
//! - direct UTF-8 decoding for plain text
//! - pdftotext (Poppler) for the text layer of PDFs
//! - Tesseract OCR for image-only PDFs (default)
//! - OCRS for pure-Rust OCR (feature: ocr-ocrs)
//!
//! `TextExtractor` orchestrates the passes; `RecognitionEngine` owns the
//! OCR backend used for the fallback.

mod backend;
mod engine;
mod extractor;
mod pdf_utils;
mod progress;
mod tesseract;
mod text_layer;
mod tools;

#[cfg(feature = "ocr-ocrs")]
mod ocrs_backend;

pub use backend::{create_backend, OcrBackend, OcrBackendType, OcrConfig, OcrError};
pub use engine::{EngineConfig, RecognitionEngine};
pub use extractor::{
    needs_ocr, ExtractedText, ExtractionError, ExtractionFault, ExtractionMethod, TextExtractor,
    DEFAULT_MIN_TEXT_CHARS,
};
pub use progress::{scaled_percent, ProgressReporter};
pub use tesseract::TesseractBackend;
pub use text_layer::{DocumentOpener, PaginatedDocument, PopplerDocument, PopplerOpener};
pub use tools::{check_binary, install_hint};

#[cfg(feature = "ocr-ocrs")]
pub use ocrs_backend::OcrsBackend;
