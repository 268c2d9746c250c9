//! Best-effort progress reporting for extraction.
//!
//! Reports are delivered synchronously and never awaited. A panicking
//! callback or a dropped receiver is logged and otherwise ignored.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio::sync::mpsc;

type Callback = Box<dyn Fn(u8) + Send + Sync>;

enum Sink {
    None,
    Callback(Callback),
    Channel(mpsc::UnboundedSender<u8>),
}

/// Receives integer progress percentages in `[0, 100]`.
pub struct ProgressReporter {
    sink: Sink,
}

impl ProgressReporter {
    /// A reporter that discards everything.
    pub fn silent() -> Self {
        Self { sink: Sink::None }
    }

    pub fn from_fn<F>(callback: F) -> Self
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        Self {
            sink: Sink::Callback(Box::new(callback)),
        }
    }

    /// A reporter feeding an unbounded channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<u8>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                sink: Sink::Channel(tx),
            },
            rx,
        )
    }

    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        match &self.sink {
            Sink::None => {}
            Sink::Callback(callback) => {
                if catch_unwind(AssertUnwindSafe(|| callback(percent))).is_err() {
                    tracing::warn!("Progress callback panicked at {}%, ignoring", percent);
                }
            }
            Sink::Channel(tx) => {
                let _ = tx.send(percent);
            }
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.sink {
            Sink::None => "silent",
            Sink::Callback(_) => "callback",
            Sink::Channel(_) => "channel",
        };
        f.debug_struct("ProgressReporter").field("sink", &kind).finish()
    }
}

/// `base + round(done / total * span)`, rounding halves up.
pub fn scaled_percent(done: u32, total: u32, base: u8, span: u8) -> u8 {
    if total == 0 {
        return base.saturating_add(span).min(100);
    }
    let done = u64::from(done.min(total));
    let total = u64::from(total);
    let scaled = (2 * done * u64::from(span) + total) / (2 * total);
    (u64::from(base) + scaled).min(100) as u8
}
