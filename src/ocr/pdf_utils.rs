//! Poppler command-line helpers: page count, per-page text, page rasters.

use std::path::{Path, PathBuf};
use std::process::Output;

use super::extractor::ExtractionFault;
use super::tools::{command, install_hint};

/// Handle command output, extracting stdout on success or returning appropriate error.
fn handle_cmd_output(
    result: std::io::Result<Output>,
    tool: &str,
    error_prefix: &str,
) -> Result<String, ExtractionFault> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionFault::ToolFailed(format!(
                    "{}: {}",
                    error_prefix,
                    stderr.trim()
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionFault::ToolNotFound(install_hint(tool)))
        }
        Err(e) => Err(ExtractionFault::Io(e)),
    }
}

/// Read the page count of a PDF with pdfinfo.
pub async fn page_count(pdf_path: &Path) -> Result<u32, ExtractionFault> {
    let output = command("pdfinfo").arg(pdf_path).output().await;
    let stdout = handle_cmd_output(output, "pdfinfo", "pdfinfo could not open document")?;

    match parse_page_count(&stdout) {
        Some(0) | None => Err(ExtractionFault::NoPages),
        Some(pages) => Ok(pages),
    }
}

/// Pull the `Pages:` value out of pdfinfo output.
pub fn parse_page_count(pdfinfo_output: &str) -> Option<u32> {
    pdfinfo_output
        .lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
}

/// Extract the text layer of one page (1-indexed) with pdftotext.
pub async fn page_text(pdf_path: &Path, page: u32) -> Result<String, ExtractionFault> {
    let page_str = page.to_string();
    let output = command("pdftotext")
        .args(["-enc", "UTF-8", "-f", &page_str, "-l", &page_str])
        .arg(pdf_path)
        .arg("-") // Output to stdout
        .output()
        .await;

    let raw = handle_cmd_output(
        output,
        "pdftotext",
        &format!("pdftotext failed on page {}", page),
    )?;
    Ok(join_text_runs(&raw))
}

/// Join non-empty text runs (one per output line) with single spaces.
pub fn join_text_runs(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|run| !run.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render one page (1-indexed) to a PNG in `output_dir`.
pub async fn render_page(
    pdf_path: &Path,
    page: u32,
    dpi: u32,
    output_dir: &Path,
) -> Result<PathBuf, ExtractionFault> {
    let page_str = page.to_string();
    let dpi_str = dpi.to_string();
    let output_prefix = output_dir.join(format!("page-{}", page));

    let output = command("pdftoppm")
        .args(["-png", "-singlefile", "-r", &dpi_str, "-f", &page_str, "-l", &page_str])
        .arg(pdf_path)
        .arg(&output_prefix)
        .output()
        .await;

    handle_cmd_output(
        output,
        "pdftoppm",
        &format!("pdftoppm failed to render page {}", page),
    )?;

    let image_path = output_prefix.with_extension("png");
    if image_path.exists() {
        Ok(image_path)
    } else {
        Err(ExtractionFault::ToolFailed(format!(
            "No image generated for page {}",
            page
        )))
    }
}
