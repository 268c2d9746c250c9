//! Staged progress narration for the analysis simulator.

use std::time::Duration;

use futures::Stream;
use rand::rngs::StdRng;
use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::models::StageUpdate;

/// Stage names, in the order they are reported.
pub const STAGES: [&str; 8] = [
    "Extracting text...",
    "Checking writing patterns...",
    "Running AI-authorship classifier...",
    "Analyzing coherence & structure...",
    "Evaluating grammar...",
    "Scanning for plagiarism...",
    "Checking factual reliability...",
    "Generating final report...",
];

/// Cumulative progress after stage `index`: `round((index + 1) / 8 * 100)`.
pub fn stage_percent(index: usize) -> u8 {
    let total = STAGES.len();
    let done = (index + 1).min(total);
    ((200 * done + total) / (2 * total)) as u8
}

/// The stage sequence was abandoned through its cancellation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Analysis cancelled")]
pub struct Cancelled;

/// Lazy, single-pass sequence of analysis stages.
///
/// Each call to `next` first waits out the delay owed for the previously
/// yielded stage. Once exhausted or cancelled it yields nothing further.
pub struct StageProgress {
    next_index: usize,
    delay_owed: bool,
    finished: bool,
    rng: StdRng,
    min_delay: Duration,
    max_delay: Duration,
    cancel: CancellationToken,
}

impl StageProgress {
    pub(super) fn new(
        rng: StdRng,
        min_delay: Duration,
        max_delay: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            next_index: 0,
            delay_owed: false,
            finished: false,
            rng,
            min_delay,
            max_delay,
            cancel,
        }
    }

    /// Whether the sequence has ended (drained or cancelled).
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance to the next stage.
    pub async fn next(&mut self) -> Result<Option<StageUpdate>, Cancelled> {
        if self.finished {
            return Ok(None);
        }
        if self.cancel.is_cancelled() {
            self.finished = true;
            return Err(Cancelled);
        }

        if self.delay_owed {
            let delay = self.draw_delay();
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    self.finished = true;
                    return Err(Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
            self.delay_owed = false;
        }

        let index = self.next_index;
        let Some(stage) = STAGES.get(index) else {
            self.finished = true;
            return Ok(None);
        };

        self.next_index += 1;
        self.delay_owed = true;
        tracing::debug!("Analysis stage {}/{}: {}", index + 1, STAGES.len(), stage);

        Ok(Some(StageUpdate {
            index,
            stage: (*stage).to_string(),
            progress: stage_percent(index),
        }))
    }

    /// Adapt the sequence into a stream. A cancellation ends the stream
    /// after yielding one `Err(Cancelled)`.
    pub fn into_stream(self) -> impl Stream<Item = Result<StageUpdate, Cancelled>> + Send {
        futures::stream::unfold(self, |mut stages| async move {
            match stages.next().await {
                Ok(Some(update)) => Some((Ok(update), stages)),
                Ok(None) => None,
                Err(cancelled) => Some((Err(cancelled), stages)),
            }
        })
    }

    fn draw_delay(&mut self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        if max <= min {
            return self.min_delay;
        }
        Duration::from_millis(self.rng.random_range(min..max))
    }
}
