//! Source documents selected for extraction.
//!
//! A `SourceDocument` is the immutable payload plus its declared media kind.
//! The kind comes from the declared MIME type (usually guessed from the file
//! extension), never from content sniffing.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Declared media kind of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "mime_type")]
pub enum DocumentKind {
    PlainText,
    Paginated,
    Unsupported(String),
}

impl DocumentKind {
    /// Classify a declared MIME type.
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        match essence.as_str() {
            "text/plain" => Self::PlainText,
            "application/pdf" => Self::Paginated,
            _ => Self::Unsupported(essence),
        }
    }

    /// Classify by file extension, the way an upload form declares it.
    pub fn from_path(path: &Path) -> Self {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        Self::from_mime(mime.essence_str())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::PlainText => "text/plain",
            Self::Paginated => "application/pdf",
            Self::Unsupported(mime) => mime,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-selected document: opaque bytes plus declared kind.
///
/// Cloning is cheap; the payload is shared and never mutated.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    name: String,
    kind: DocumentKind,
    payload: Arc<[u8]>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, kind: DocumentKind, payload: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            kind,
            payload: payload.into(),
        }
    }

    /// Build a plain-text document from a string.
    pub fn plain_text(name: impl Into<String>, text: &str) -> Self {
        Self::new(name, DocumentKind::PlainText, text.as_bytes())
    }

    /// Read a document from disk, declaring its kind from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let payload = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let kind = DocumentKind::from_path(path);

        if let Some(sniffed) = sniff_mime(&payload) {
            if kind.is_supported() && sniffed != kind.as_str() {
                tracing::warn!(
                    "{}: declared as {} but content looks like {}",
                    name,
                    kind,
                    sniffed
                );
            }
        }

        Ok(Self::new(name, kind, payload))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &DocumentKind {
        &self.kind
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn byte_len(&self) -> usize {
        self.payload.len()
    }

    /// SHA-256 of the payload, hex encoded.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.payload);
        hex::encode(hasher.finalize())
    }
}

/// Detect a MIME type from magic bytes. Plain text has no signature.
fn sniff_mime(payload: &[u8]) -> Option<&'static str> {
    infer::get(payload).map(|t| t.mime_type())
}
