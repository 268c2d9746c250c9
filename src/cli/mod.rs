//! Command-line front end.

mod commands;
mod helpers;
mod progress;

pub use commands::{is_verbose, run};
