//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod analyze;
mod check;
mod extract;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use veritext::config::load_settings;

#[derive(Parser)]
#[command(name = "veritext")]
#[command(about = "Extract document text with OCR fallback and run staged analysis")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a plain-text file or PDF
    Extract {
        /// File to extract
        file: PathBuf,
        /// Write the text to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the OCR escalation threshold (characters)
        #[arg(long)]
        min_chars: Option<usize>,
        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Extract a document and run the staged analysis on its text
    Analyze {
        /// File to analyze
        file: PathBuf,
        /// Report title (defaults to the file name)
        #[arg(long)]
        title: Option<String>,
        /// Report author
        #[arg(long)]
        author: Option<String>,
        /// Write a report; format follows the extension (.json or .md)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Fixed seed for reproducible scores
        #[arg(long)]
        seed: Option<u64>,
        /// Insight line for the report; repeat to add several
        #[arg(long = "insight", value_name = "TEXT")]
        insights: Vec<String>,
    },

    /// Check if required extraction and OCR tools are installed
    Check,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (settings, config) = load_settings(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Extract {
            file,
            output,
            min_chars,
            quiet,
        } => extract::cmd_extract(&settings, &file, output.as_deref(), min_chars, quiet).await,
        Commands::Analyze {
            file,
            title,
            author,
            output,
            seed,
            insights,
        } => {
            let mut settings = settings;
            if seed.is_some() {
                settings.seed = seed;
            }
            analyze::cmd_analyze(
                &settings,
                &file,
                analyze::ReportOptions {
                    title,
                    author,
                    output,
                    insights,
                },
            )
            .await
        }
        Commands::Check => check::cmd_check(&settings, &config).await,
    }
}
