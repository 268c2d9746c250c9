//! Report export: analysis result plus extraction facts, as JSON or Markdown.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AnalysisResult, SourceDocument};
use crate::ocr::{ExtractedText, ExtractionMethod};

/// Characters of extracted text kept in the report preview.
pub const PREVIEW_CHARS: usize = 2000;

/// Insights used when the analysis supplies none.
pub const DEFAULT_INSIGHTS: [&str; 3] = [
    "Possible AI influence detected; investigate repetitive phrasing.",
    "Moderate textual overlap with known sources.",
    "High factual reliability score.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Markdown,
}

impl ReportFormat {
    /// Pick a format from the output file extension (default JSON).
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("md") | Some("markdown") => Self::Markdown,
            _ => Self::Json,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub title: String,
    pub author: String,
    pub generated_at: DateTime<Utc>,
    pub source_name: String,
    pub source_kind: String,
    pub source_sha256: String,
    pub byte_len: usize,
    pub method: ExtractionMethod,
    pub page_count: Option<u32>,
    pub character_count: usize,
    pub word_count: usize,
    pub result: AnalysisResult,
    pub insights: Vec<String>,
    pub preview: String,
}

impl AnalysisReport {
    pub fn new(document: &SourceDocument, extracted: &ExtractedText, result: AnalysisResult) -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            generated_at: Utc::now(),
            source_name: document.name().to_string(),
            source_kind: document.kind().to_string(),
            source_sha256: document.content_hash(),
            byte_len: document.byte_len(),
            method: extracted.method,
            page_count: extracted.page_count,
            character_count: extracted.text.chars().count(),
            word_count: extracted.text.split_whitespace().count(),
            result,
            insights: DEFAULT_INSIGHTS.iter().map(|s| s.to_string()).collect(),
            preview: preview(&extracted.text, PREVIEW_CHARS),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into().trim().to_string();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into().trim().to_string();
        self
    }

    pub fn with_insights(mut self, insights: Vec<String>) -> Self {
        if !insights.is_empty() {
            self.insights = insights;
        }
        self
    }

    /// Title to display; falls back to the source file name.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.source_name
        } else {
            &self.title
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}", self.display_title());
        if !self.author.is_empty() {
            let _ = writeln!(out, "\n*by {}*", self.author);
        }
        let _ = writeln!(
            out,
            "\nGenerated {} from `{}` ({}, {} bytes, via {}{}).",
            self.generated_at.format("%Y-%m-%d %H:%M UTC"),
            self.source_name,
            self.source_kind,
            self.byte_len,
            self.method,
            self.page_count
                .map(|n| format!(", {} pages", n))
                .unwrap_or_default()
        );

        let _ = writeln!(out, "\n## Summary\n\n{}", self.result.summary);

        let _ = writeln!(out, "\n## Scores\n\n| Metric | Score |\n|---|---|");
        for (label, score) in self.result.scores() {
            let _ = writeln!(out, "| {} | {}% |", label, score);
        }

        let _ = writeln!(out, "\n## Insights & Recommendations\n");
        for (i, insight) in self.insights.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, insight);
        }

        let _ = writeln!(
            out,
            "\n## Extracted text preview\n\n{} words, {} characters.\n\n```text\n{}\n```",
            self.word_count, self.character_count, self.preview
        );
        out
    }

    /// Write the report to `path` in the given format.
    pub async fn write_to(&self, path: &Path, format: ReportFormat) -> anyhow::Result<()> {
        let contents = match format {
            ReportFormat::Json => self.to_json()?,
            ReportFormat::Markdown => self.to_markdown(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
        tracing::info!("Wrote report to {}", path.display());
        Ok(())
    }
}

/// First `max_chars` characters, with `...` appended when truncated.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
