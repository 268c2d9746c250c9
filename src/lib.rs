//! Veritext - document text extraction with OCR fallback.
//!
//! Plain text is decoded directly. Paginated documents are read through
//! their embedded text layer first and re-read page by page with OCR when
//! that layer is too thin. A staged analysis simulator scores the result.

pub mod config;
pub mod models;
pub mod ocr;
pub mod services;

pub use models::{AnalysisResult, DocumentKind, SourceDocument, StageUpdate};
pub use ocr::{ExtractedText, ExtractionError, ExtractionMethod, ProgressReporter, TextExtractor};
pub use services::{AnalysisSimulator, Simulation, SimulationConfig};
