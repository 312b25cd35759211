//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Kennel - Datadog monitors, dashboards and SLOs as code.
#[derive(Parser, Debug)]
#[command(name = "kennel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a project file or directory of project files.
    #[arg(short, long, global = true, env = "KENNEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate project files without contacting the API.
    Validate,

    /// Show the changes a sync would make, without applying them.
    Plan {
        /// Restrict the run to one project.
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Apply the plan to the remote account.
    Apply {
        /// Restrict the run to one project.
        #[arg(short, long)]
        project: Option<String>,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}
