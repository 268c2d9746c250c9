//! Data models for veritext.

mod analysis;
mod document;

pub use analysis::{AnalysisResult, StageUpdate};
pub use document::{DocumentKind, SourceDocument};
