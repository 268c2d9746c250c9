//! Text extraction from source documents with OCR fallback.
//!
//! Plain text is decoded directly. Paginated documents are read through
//! their text layer first; when that yields almost nothing, every page is
//! rasterized and run through the recognition engine instead.
//!
//! Progress: the text-layer pass owns 0..=50, the OCR pass 50..=100.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::backend::OcrError;
use super::engine::RecognitionEngine;
use super::progress::{scaled_percent, ProgressReporter};
use super::text_layer::{DocumentOpener, PaginatedDocument};
use crate::models::{DocumentKind, SourceDocument};

/// Default escalation threshold: trimmed text-layer output this short or
/// shorter is treated as "no usable text layer".
pub const DEFAULT_MIN_TEXT_CHARS: usize = 20;

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(#[from] ExtractionFault),

    #[error("Extraction cancelled")]
    Cancelled,
}

/// Lower-level fault that aborted an extraction.
#[derive(Debug, Error)]
pub enum ExtractionFault {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("{0}")]
    ToolFailed(String),

    #[error("Document has no pages")]
    NoPages,

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Method used to extract text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Payload decoded as UTF-8 text.
    PlainText,
    /// Embedded text layer of a paginated document.
    TextLayer,
    /// Optical recognition of rendered pages.
    Ocr,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "plain_text",
            Self::TextLayer => "text_layer",
            Self::Ocr => "ocr",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final text of one extraction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Extracted text content, pages in document order.
    pub text: String,
    /// Method used for extraction.
    pub method: ExtractionMethod,
    /// Number of pages processed (for paginated documents).
    pub page_count: Option<u32>,
}

/// Whether text-layer output is too thin to keep.
pub fn needs_ocr(text: &str, min_text_chars: usize) -> bool {
    text.trim().chars().count() <= min_text_chars
}

/// Extraction orchestrator.
pub struct TextExtractor {
    opener: Arc<dyn DocumentOpener>,
    engine: Arc<RecognitionEngine>,
    min_text_chars: usize,
}

impl TextExtractor {
    /// Create an extractor around a document opener and a recognition engine.
    pub fn new(opener: Arc<dyn DocumentOpener>, engine: Arc<RecognitionEngine>) -> Self {
        Self {
            opener,
            engine,
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
        }
    }

    /// Set the OCR escalation threshold.
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_text_chars = min_chars;
        self
    }

    pub fn engine(&self) -> &Arc<RecognitionEngine> {
        &self.engine
    }

    /// Extract text from a document.
    ///
    /// All-or-nothing: any page fault aborts the call and no partial text is
    /// returned. Progress reaches exactly 100 only on success.
    pub async fn extract(
        &self,
        document: &SourceDocument,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<ExtractedText, ExtractionError> {
        let result = match document.kind() {
            DocumentKind::Unsupported(mime) => {
                return Err(ExtractionError::UnsupportedFormat(mime.clone()));
            }
            _ if cancel.is_cancelled() => Err(ExtractionError::Cancelled),
            DocumentKind::PlainText => Ok(Self::extract_plain(document, progress)),
            DocumentKind::Paginated => self.extract_paginated(document, progress, cancel).await,
        };

        match &result {
            Ok(extracted) => tracing::info!(
                "Extracted {} chars from {} via {}",
                extracted.text.len(),
                document.name(),
                extracted.method
            ),
            Err(ExtractionError::Cancelled) => {
                tracing::debug!("Extraction of {} cancelled", document.name())
            }
            Err(e) => tracing::warn!("Extraction of {} failed: {}", document.name(), e),
        }
        result
    }

    fn extract_plain(document: &SourceDocument, progress: &ProgressReporter) -> ExtractedText {
        let decoded = String::from_utf8_lossy(document.payload());
        let text = decoded
            .strip_prefix('\u{feff}')
            .unwrap_or(&decoded)
            .to_string();
        progress.report(100);
        ExtractedText {
            text,
            method: ExtractionMethod::PlainText,
            page_count: None,
        }
    }

    async fn extract_paginated(
        &self,
        document: &SourceDocument,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<ExtractedText, ExtractionError> {
        let pdf = guarded(cancel, self.opener.open(document.payload())).await?;
        let total = pdf.page_count();
        if total == 0 {
            return Err(ExtractionFault::NoPages.into());
        }

        let text = self.text_layer_pass(pdf.as_ref(), progress, cancel).await?;
        if !needs_ocr(&text, self.min_text_chars) {
            progress.report(100);
            return Ok(ExtractedText {
                text,
                method: ExtractionMethod::TextLayer,
                page_count: Some(total),
            });
        }

        tracing::info!(
            "{}: text layer has {} chars (threshold {}), falling back to OCR on {} pages",
            document.name(),
            text.trim().chars().count(),
            self.min_text_chars,
            total
        );

        let text = self.ocr_pass(pdf.as_ref(), progress, cancel).await?;
        Ok(ExtractedText {
            text,
            method: ExtractionMethod::Ocr,
            page_count: Some(total),
        })
    }

    async fn text_layer_pass(
        &self,
        pdf: &dyn PaginatedDocument,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<String, ExtractionError> {
        let total = pdf.page_count();
        let mut text = String::new();

        for page in 1..=total {
            let page_text = guarded(cancel, pdf.page_text(page)).await?;
            tracing::debug!("Page {}/{}: {} chars in text layer", page, total, page_text.len());
            text.push_str(&page_text);
            text.push('\n');
            progress.report(scaled_percent(page, total, 0, 50));
        }

        Ok(text)
    }

    async fn ocr_pass(
        &self,
        pdf: &dyn PaginatedDocument,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<String, ExtractionError> {
        let total = pdf.page_count();
        let mut text = String::new();

        for page in 1..=total {
            let page_text = guarded(cancel, self.engine.recognize_page_lazily(pdf, page)).await?;
            tracing::debug!("Page {}/{}: {} chars recognized", page, total, page_text.len());
            text.push_str(page_text.trim_end());
            text.push('\n');
            progress.report(scaled_percent(page, total, 50, 50));
        }

        Ok(text)
    }
}

/// Race a suspension point against cancellation.
async fn guarded<T, F>(cancel: &CancellationToken, operation: F) -> Result<T, ExtractionError>
where
    F: Future<Output = Result<T, ExtractionFault>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ExtractionError::Cancelled),
        result = operation => result.map_err(ExtractionError::from),
    }
}
