//! Document analysis command (extraction followed by staged scoring).

use std::path::{Path, PathBuf};

use console::style;

use veritext::config::Settings;
use veritext::services::{AnalysisReport, AnalysisSimulator, ReportFormat};

use crate::cli::helpers::{build_extractor, cancel_on_ctrl_c, load_document, truncate};
use crate::cli::progress::{ExtractionProgress, StageBar};

/// Report metadata and destination.
pub struct ReportOptions {
    pub title: Option<String>,
    pub author: Option<String>,
    pub output: Option<PathBuf>,
    /// Replaces the default insights when non-empty.
    pub insights: Vec<String>,
}

pub async fn cmd_analyze(
    settings: &Settings,
    file: &Path,
    options: ReportOptions,
) -> anyhow::Result<()> {
    let document = load_document(file, settings).await?;
    let extractor = build_extractor(settings)?;
    let cancel = cancel_on_ctrl_c();

    let bar = ExtractionProgress::new(document.name());
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

    let simulator = AnalysisSimulator::new(settings.simulation_config());
    let mut simulation = simulator.simulate(&extracted.text, cancel.clone());

    let stage_bar = StageBar::new();
    loop {
        match simulation.stages.next().await {
            Ok(Some(update)) => stage_bar.update(&update),
            Ok(None) => break,
            Err(cancelled) => {
                stage_bar.abandon("cancelled");
                return Err(cancelled.into());
            }
        }
    }
    stage_bar.finish();

    let mut report = AnalysisReport::new(&document, &extracted, simulation.result)
        .with_insights(options.insights);
    if let Some(title) = options.title {
        report = report.with_title(title);
    }
    if let Some(author) = options.author {
        report = report.with_author(author);
    }

    print_report(&report);

    if let Some(path) = options.output {
        report.write_to(&path, ReportFormat::from_path(&path)).await?;
        println!(
            "\n{} Report saved to {}",
            style("✓").green(),
            path.display()
        );
    }

    Ok(())
}

fn print_report(report: &AnalysisReport) {
    println!("\n{}", style(report.display_title()).bold());
    if !report.author.is_empty() {
        println!("{}", style(format!("by {}", report.author)).dim());
    }
    println!("{}", "-".repeat(50));
    println!(
        "  {:<15} {} ({} words)",
        "Extracted via",
        report.method,
        report.word_count
    );
    if let Some(pages) = report.page_count {
        println!("  {:<15} {}", "Pages", pages);
    }

    println!("\n{}", style("Scores:").cyan());
    // AI authorship and plagiarism come first; lower is better for both.
    for (i, (label, score)) in report.result.scores().into_iter().enumerate() {
        println!("  {:<15} {}", label, styled_score(score, i < 2));
    }

    println!("\n{}", style("Summary:").cyan());
    println!("  {}", report.result.summary);

    println!("\n{}", style("Insights:").cyan());
    for insight in &report.insights {
        println!("  {} {}", style("→").green(), insight);
    }

    if !report.preview.is_empty() {
        println!("\n{}", style("Preview:").cyan());
        let first_line = report.preview.lines().find(|l| !l.trim().is_empty());
        if let Some(line) = first_line {
            println!("  {}", style(truncate(line.trim(), 70)).dim());
        }
    }
}

fn styled_score(score: u8, lower_is_better: bool) -> console::StyledObject<String> {
    let text = format!("{:>3}%", score);
    let good = if lower_is_better { score < 35 } else { score >= 75 };
    if good {
        style(text).green()
    } else {
        style(text).yellow()
    }
}
