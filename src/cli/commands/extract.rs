//! Text extraction command.

use std::path::Path;

use console::style;

use veritext::config::Settings;

use crate::cli::helpers::{build_extractor, cancel_on_ctrl_c, load_document};
use crate::cli::progress::ExtractionProgress;

/// Extract text from a single file.
pub async fn cmd_extract(
    settings: &Settings,
    file: &Path,
    output: Option<&Path>,
    min_chars: Option<usize>,
    quiet: bool,
) -> anyhow::Result<()> {
    let document = load_document(file, settings).await?;
    let mut extractor = build_extractor(settings)?;
    if let Some(min_chars) = min_chars {
        extractor = extractor.with_min_chars(min_chars);
    }

    let bar = if quiet {
        ExtractionProgress::hidden()
    } else {
        ExtractionProgress::new(document.name())
    };
    let cancel = cancel_on_ctrl_c();

    let result = extractor
        .extract(&document, &bar.reporter(), &cancel)
        .await;
    extractor.engine().close().await;

    let extracted = match result {
        Ok(extracted) => {
            bar.finish();
            extracted
        }
        Err(e) => {
            bar.abandon("failed");
            return Err(e.into());
        }
    };

    match output {
        Some(path) => {
            tokio::fs::write(path, &extracted.text).await?;
            if !quiet {
                eprintln!(
                    "{} {} chars via {}{} → {}",
                    style("✓").green(),
                    extracted.text.chars().count(),
                    extracted.method,
                    extracted
                        .page_count
                        .map(|n| format!(" ({} pages)", n))
                        .unwrap_or_default(),
                    path.display()
                );
            }
        }
        None => print!("{}", extracted.text),
    }

    Ok(())
}
