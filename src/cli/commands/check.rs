//! Tool availability check.

use console::style;

use veritext::config::{Config, Settings};
use veritext::ocr::{install_hint, OcrBackend, OcrBackendType, PopplerOpener, TesseractBackend};

/// Report which extraction tools and OCR backends are usable.
pub async fn cmd_check(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    println!("\n{}", style("Extraction Tool Status").bold());
    println!("{}", "-".repeat(50));

    let tools = PopplerOpener::check_tools();
    println!("\n{}", style("PDF Tools:").cyan());
    let mut all_found = true;

    for (tool, available) in &tools {
        let status = if *available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }

    println!("\n{}", style("OCR Backends:").cyan());

    let tesseract = TesseractBackend::with_config(settings.backend_config());
    let tesseract_status = if tesseract.is_available() {
        style("✓ available").green()
    } else {
        style("✗ not available").red()
    };
    println!("  {:<15} {}", "Tesseract", tesseract_status);
    if !tesseract.is_available() {
        println!(
            "                  {}",
            style(tesseract.availability_hint()).dim()
        );
    }

    #[cfg(feature = "ocr-ocrs")]
    {
        use veritext::ocr::OcrsBackend;
        let ocrs = OcrsBackend::with_config(settings.backend_config());
        println!("  {:<15} {}", "OCRS", style("✓ available").green());
        println!(
            "                  {}",
            style(ocrs.availability_hint()).dim()
        );
    }
    #[cfg(not(feature = "ocr-ocrs"))]
    {
        println!(
            "  {:<15} {}",
            "OCRS",
            style("not compiled (enable ocr-ocrs feature)").dim()
        );
    }

    println!("\n{}", style("Configuration:").cyan());
    match &config.source_path {
        Some(path) => println!("  {:<15} {}", "Config file", path.display()),
        None => println!("  {:<15} {}", "Config file", style("none (defaults)").dim()),
    }
    let selected = if OcrBackendType::compiled().contains(&settings.ocr_backend) {
        style(settings.ocr_backend.as_str()).green()
    } else {
        style(settings.ocr_backend.as_str()).red()
    };
    println!("  {:<15} {}", "OCR backend", selected);
    println!("  {:<15} {}", "Language", settings.ocr_language);
    println!(
        "  {:<15} {} DPI",
        "Render",
        settings.engine_config().render_dpi()
    );
    println!("  {:<15} {} chars", "OCR threshold", settings.min_text_chars);
    println!(
        "  {:<15} {}s per page",
        "OCR timeout",
        settings.page_timeout.as_secs()
    );

    println!();

    if all_found && tesseract.is_available() {
        println!("{} Text-layer and OCR extraction are available", style("✓").green());
    } else {
        println!(
            "{} Some tools are missing. Install them for full extraction support:",
            style("!").yellow()
        );
        for (tool, _) in tools.iter().filter(|(_, available)| !available) {
            println!("  - {}", install_hint(tool));
        }
        if !tesseract.is_available() {
            println!("  - {}", install_hint("tesseract"));
        }
    }

    Ok(())
}
