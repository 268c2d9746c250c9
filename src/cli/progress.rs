//! Terminal progress bars for extraction and analysis.

use indicatif::{ProgressBar, ProgressStyle};

use veritext::models::StageUpdate;
use veritext::ocr::ProgressReporter;

fn percent_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg:<28} [{bar:30.cyan/blue}] {pos:>3}%")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb.set_message(message.to_string());
    pb
}

/// Progress bar driven by extraction percentages.
pub struct ExtractionProgress {
    pb: ProgressBar,
}

impl ExtractionProgress {
    pub fn new(name: &str) -> Self {
        Self {
            pb: percent_bar(&format!("Extracting {}", name)),
        }
    }

    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
        }
    }

    /// A reporter that moves this bar. Switches the label once OCR starts.
    pub fn reporter(&self) -> ProgressReporter {
        let pb = self.pb.clone();
        ProgressReporter::from_fn(move |percent| {
            if percent > 50 && percent < 100 && pb.position() <= 50 {
                pb.set_message("Running OCR");
            }
            pb.set_position(percent as u64);
        })
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }

    pub fn abandon(&self, message: &str) {
        self.pb.abandon_with_message(message.to_string());
    }
}

/// Progress bar for the analysis stage sequence.
pub struct StageBar {
    pb: ProgressBar,
}

impl StageBar {
    pub fn new() -> Self {
        let pb = percent_bar("Starting analysis...");
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { pb }
    }

    pub fn update(&self, update: &StageUpdate) {
        self.pb.set_message(update.stage.clone());
        self.pb.set_position(update.progress as u64);
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }

    pub fn abandon(&self, message: &str) {
        self.pb.abandon_with_message(message.to_string());
    }
}
