//! Analysis stage and result records.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// One step of the staged analysis narration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageUpdate {
    /// Zero-based position in the stage sequence.
    pub index: usize,
    /// Human-readable stage name.
    pub stage: String,
    /// Cumulative progress percentage after this stage.
    pub progress: u8,
}

/// Scores and narrative summary for one analyzed document.
///
/// Every field is always present so consumers never fill in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub ai_score: u8,
    pub plagiarism: u8,
    pub coherence: u8,
    pub grammar: u8,
    pub readability: u8,
    pub reliability: u8,
    pub summary: String,
}

impl AnalysisResult {
    pub const AI_SCORE_RANGE: Range<u8> = 20..70;
    pub const PLAGIARISM_RANGE: Range<u8> = 5..20;
    pub const COHERENCE_RANGE: Range<u8> = 70..90;
    pub const GRAMMAR_RANGE: Range<u8> = 80..95;
    pub const READABILITY_RANGE: Range<u8> = 65..85;
    pub const RELIABILITY_RANGE: Range<u8> = 60..85;

    /// Labelled scores in display order.
    pub fn scores(&self) -> [(&'static str, u8); 6] {
        [
            ("AI authorship", self.ai_score),
            ("Plagiarism", self.plagiarism),
            ("Coherence", self.coherence),
            ("Grammar", self.grammar),
            ("Readability", self.readability),
            ("Reliability", self.reliability),
        ]
    }

    /// Check every score against its documented range.
    pub fn is_within_bounds(&self) -> bool {
        Self::AI_SCORE_RANGE.contains(&self.ai_score)
            && Self::PLAGIARISM_RANGE.contains(&self.plagiarism)
            && Self::COHERENCE_RANGE.contains(&self.coherence)
            && Self::GRAMMAR_RANGE.contains(&self.grammar)
            && Self::READABILITY_RANGE.contains(&self.readability)
            && Self::RELIABILITY_RANGE.contains(&self.reliability)
    }
}
