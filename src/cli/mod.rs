//! Command-line interface for kennel.

mod commands;
mod output;

pub use commands::{Cli, Commands};
pub use output::OutputFormatter;
