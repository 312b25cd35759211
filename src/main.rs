//! Kennel CLI entrypoint.
//!
//! This is the main entrypoint for the kennel command-line tool.

use std::path::PathBuf;
use std::process::ExitCode;

use kennel::cli::{Cli, Commands, OutputFormatter};
use kennel::config::{ConfigParser, DEFAULT_PROJECTS_DIR, load_declarations};
use kennel::datadog::{ApiCredentials, DatadogClient};
use kennel::error::Result;
use kennel::models::{Project, Resource};
use kennel::syncer::{Confirmation, ConfirmationGate, Syncer};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new();
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PROJECTS_DIR));

    match cli.command {
        Commands::Validate => cmd_validate(&config_path, &formatter),
        Commands::Plan { project } => {
            cmd_plan(&config_path, project.as_deref(), &formatter).await
        }
        Commands::Apply { project, yes } => {
            cmd_apply(&config_path, project.as_deref(), yes, &formatter).await
        }
    }
}

/// Loads declarations and builds every payload, surfacing validation errors.
fn cmd_validate(config_path: &PathBuf, formatter: &OutputFormatter) -> Result<()> {
    let parser = ConfigParser::new();
    let (projects, mut resources) = load_declarations(&parser, config_path)?;

    for resource in &mut resources {
        resource.build_json()?;
    }

    formatter.line(format!(
        "Validated {} resources across {} projects",
        resources.len(),
        projects.len()
    ));
    Ok(())
}

/// Shows the plan without applying it.
async fn cmd_plan(
    config_path: &PathBuf,
    project: Option<&str>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let (client, subdomain, projects, resources) = connect(config_path)?;
    let syncer = Syncer::new(&client, subdomain);

    let plan = formatter
        .report("Plan", syncer.plan(&projects, resources, project))
        .await?;
    formatter.line(plan.to_string().trim_end());
    Ok(())
}

/// Plans, confirms, and applies.
async fn cmd_apply(
    config_path: &PathBuf,
    project: Option<&str>,
    yes: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let (client, subdomain, projects, resources) = connect(config_path)?;
    let syncer = Syncer::new(&client, subdomain);

    let plan = formatter
        .report("Plan", syncer.plan(&projects, resources, project))
        .await?;
    formatter.line(plan.to_string().trim_end());

    match ConfirmationGate::new(yes).resolve(&plan)? {
        Confirmation::Approved => {
            let report = syncer.apply(plan).await?;
            for line in report {
                formatter.line(line);
            }
            Ok(())
        }
        Confirmation::Denied | Confirmation::Pending => {
            info!("Plan not applied");
            Ok(())
        }
    }
}

/// Shared setup for commands that contact the API.
#[allow(clippy::type_complexity)]
fn connect(
    config_path: &PathBuf,
) -> Result<(DatadogClient, Option<String>, Vec<Project>, Vec<Resource>)> {
    let parser = ConfigParser::new();
    parser.load_dotenv()?;

    let credentials = ApiCredentials::from_env()?;
    let subdomain = credentials.subdomain.clone();
    let client = DatadogClient::new(credentials)?;

    let (projects, resources) = load_declarations(&parser, config_path)?;
    Ok((client, subdomain, projects, resources))
}
