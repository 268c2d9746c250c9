//! Paginated documents and their embedded text layer.
//!
//! `DocumentOpener` decodes a payload into a `PaginatedDocument`; the
//! document then serves per-page text and per-page rasters. The Poppler
//! implementation shells out to pdfinfo, pdftotext and pdftoppm against a
//! private temporary copy of the payload.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::TempDir;

use super::extractor::ExtractionFault;
use super::tools::{check_binary, POPPLER_TOOLS};
use super::pdf_utils;

/// Decodes a paginated payload.
#[async_trait]
pub trait DocumentOpener: Send + Sync {
    async fn open(&self, payload: &[u8]) -> Result<Box<dyn PaginatedDocument>, ExtractionFault>;
}

/// An opened paginated document. Pages are 1-indexed.
#[async_trait]
pub trait PaginatedDocument: Send + Sync {
    fn page_count(&self) -> u32;

    /// Text runs of one page joined by single spaces; `""` when the page
    /// has no text layer.
    async fn page_text(&self, page: u32) -> Result<String, ExtractionFault>;

    /// Rasterize one page into `output_dir`, returning the image path.
    async fn render_page(
        &self,
        page: u32,
        dpi: u32,
        output_dir: &Path,
    ) -> Result<PathBuf, ExtractionFault>;
}

/// Opens PDFs with the Poppler command-line tools.
#[derive(Debug, Default, Clone)]
pub struct PopplerOpener;

impl PopplerOpener {
    pub fn new() -> Self {
        Self
    }

    /// Check if required tools are available.
    pub fn check_tools() -> Vec<(String, bool)> {
        POPPLER_TOOLS
            .iter()
            .map(|tool| (tool.to_string(), check_binary(tool)))
            .collect()
    }
}

#[async_trait]
impl DocumentOpener for PopplerOpener {
    async fn open(&self, payload: &[u8]) -> Result<Box<dyn PaginatedDocument>, ExtractionFault> {
        let dir = TempDir::new()?;
        let path = dir.path().join("document.pdf");
        tokio::fs::write(&path, payload).await?;

        let page_count = pdf_utils::page_count(&path).await?;
        tracing::debug!("Opened PDF with {} pages", page_count);

        Ok(Box::new(PopplerDocument {
            _dir: dir,
            path,
            page_count,
        }))
    }
}

/// A PDF materialized in a temporary directory.
///
/// The directory is removed when the document is dropped.
pub struct PopplerDocument {
    _dir: TempDir,
    path: PathBuf,
    page_count: u32,
}

#[async_trait]
impl PaginatedDocument for PopplerDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    async fn page_text(&self, page: u32) -> Result<String, ExtractionFault> {
        pdf_utils::page_text(&self.path, page).await
    }

    async fn render_page(
        &self,
        page: u32,
        dpi: u32,
        output_dir: &Path,
    ) -> Result<PathBuf, ExtractionFault> {
        pdf_utils::render_page(&self.path, page, dpi, output_dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tools_lists_poppler() {
        let tools = PopplerOpener::check_tools();
        let names: Vec<_> = tools.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["pdfinfo", "pdftotext", "pdftoppm"]);
    }

    #[tokio::test]
    async fn test_open_malformed_payload_fails() {
        if !check_binary("pdfinfo") {
            return;
        }
        let result = PopplerOpener::new().open(b"%PDF-1.4 truncated").await;
        assert!(result.is_err());
    }
}
