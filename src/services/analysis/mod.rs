//! Staged analysis simulator.
//!
//! Stands in for a real scoring engine: the result is drawn from fixed
//! ranges without looking at the input text, and the stage sequence replays
//! a fixed narration with randomized pauses. A real engine replacing this
//! must keep the same stage names, percentages and result shape.

mod stages;

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;

use crate::models::AnalysisResult;

pub use stages::{stage_percent, Cancelled, StageProgress, STAGES};

/// The two narrative summaries a simulated result can carry.
pub const SUMMARIES: [&str; 2] = [
    "Mostly human-written with natural variation in style.",
    "Shows moderate AI-like patterns but still human-influenced.",
];

/// Timing and randomness settings for the simulator.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Lower bound of the pause after each stage (inclusive).
    pub min_delay: Duration,
    /// Upper bound of the pause after each stage (exclusive).
    pub max_delay: Duration,
    /// Fixed seed for reproducible scores and delays.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(600),
            max_delay: Duration::from_millis(1000),
            seed: None,
        }
    }
}

/// Output of one simulation run.
pub struct Simulation {
    /// Available immediately.
    pub result: AnalysisResult,
    /// Consumable once, independently of `result`.
    pub stages: StageProgress,
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisSimulator {
    config: SimulationConfig,
}

impl AnalysisSimulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Start a simulation. `_input_text` is accepted but not inspected.
    pub fn simulate(&self, _input_text: &str, cancel: CancellationToken) -> Simulation {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let result = draw_result(&mut rng);
        let stage_rng = StdRng::seed_from_u64(rng.random());

        Simulation {
            result,
            stages: StageProgress::new(
                stage_rng,
                self.config.min_delay,
                self.config.max_delay,
                cancel,
            ),
        }
    }
}

fn draw_result(rng: &mut StdRng) -> AnalysisResult {
    let summary = if rng.random_bool(0.5) {
        SUMMARIES[0]
    } else {
        SUMMARIES[1]
    };

    AnalysisResult {
        ai_score: rng.random_range(AnalysisResult::AI_SCORE_RANGE),
        plagiarism: rng.random_range(AnalysisResult::PLAGIARISM_RANGE),
        coherence: rng.random_range(AnalysisResult::COHERENCE_RANGE),
        grammar: rng.random_range(AnalysisResult::GRAMMAR_RANGE),
        readability: rng.random_range(AnalysisResult::READABILITY_RANGE),
        reliability: rng.random_range(AnalysisResult::RELIABILITY_RANGE),
        summary: summary.to_string(),
    }
}
