//! Shared helper functions for CLI commands.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use veritext::config::Settings;
use veritext::models::SourceDocument;
use veritext::ocr::{create_backend, PopplerOpener, RecognitionEngine, TextExtractor};

/// Read a document from disk, enforcing the configured size cap.
pub async fn load_document(path: &Path, settings: &Settings) -> anyhow::Result<SourceDocument> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?;

    if metadata.len() > settings.max_upload_bytes {
        anyhow::bail!(
            "{} is {} bytes, over the {} byte limit",
            path.display(),
            metadata.len(),
            settings.max_upload_bytes
        );
    }

    Ok(SourceDocument::from_path(path).await?)
}

/// Build an extractor from resolved settings.
pub fn build_extractor(settings: &Settings) -> anyhow::Result<TextExtractor> {
    let backend = create_backend(settings.ocr_backend, settings.backend_config())?;
    let engine = Arc::new(RecognitionEngine::new(backend, settings.engine_config()));
    Ok(TextExtractor::new(Arc::new(PopplerOpener::new()), engine)
        .with_min_chars(settings.min_text_chars))
}

/// A token that is cancelled when the user presses Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling");
            trigger.cancel();
        }
    });
    cancel
}

/// Truncate a string to a maximum number of characters, adding "..." if truncated.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
