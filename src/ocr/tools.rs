//! External command-line tools: lookup, install hints, and child processes.
//!
//! Every child spawned through [`command`] is killed when the future awaiting
//! it is dropped, so a cancelled or timed-out extraction leaves nothing
//! running behind it.

use std::process::Stdio;

use tokio::process::Command;

/// Poppler tools used for the text layer and page rendering.
pub const POPPLER_TOOLS: [&str; 3] = ["pdfinfo", "pdftotext", "pdftoppm"];

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Distribution package that ships `tool`.
pub fn package_for(tool: &str) -> &'static str {
    match tool {
        "pdfinfo" | "pdftotext" | "pdftoppm" => "poppler-utils",
        "tesseract" => "tesseract-ocr",
        _ => "the package providing it",
    }
}

/// `"<tool> (install <package>)"`, as carried by `ToolNotFound`.
pub fn install_hint(tool: &str) -> String {
    format!("{} (install {})", tool, package_for(tool))
}

/// A child-process builder that dies with its future.
pub fn command(program: &str) -> Command {
    let mut command = Command::new(program);
    command.stdin(Stdio::null()).kill_on_drop(true);
    command
}
