//! Declaration loading for the kennel synchronization engine.
//!
//! This module handles everything between files on disk and in-memory
//! declared resources:
//! - parsing and deserializing project YAML files
//! - converting declarations into [`Project`]s and [`Resource`]s

mod parser;
mod spec;

pub use parser::{ConfigParser, DEFAULT_PROJECTS_DIR};
pub use spec::{DashboardSpec, MonitorSpec, ProjectDecl, ProjectFile, SloSpec};

use crate::error::Result;
use crate::models::{Dashboard, Monitor, Project, Resource, Slo};

/// Converts loaded declarations into projects and declared resources.
///
/// Resources keep their declaration order, which the planner relies on for
/// create/update phase ordering.
///
/// # Errors
///
/// Returns an error if any declaration path fails to load.
pub fn load_declarations(
    parser: &ConfigParser,
    path: impl AsRef<std::path::Path>,
) -> Result<(Vec<Project>, Vec<Resource>)> {
    let files = parser.load(path)?;

    let mut projects = Vec::with_capacity(files.len());
    let mut resources = Vec::new();

    for (source, file) in files {
        let project = Project::new(&file.project.name, file.project.tags.clone());

        for monitor in file.monitors {
            resources.push(Resource::Monitor(Monitor::new(&project, monitor, &source)));
        }
        for dashboard in file.dashboards {
            resources.push(Resource::Dashboard(Dashboard::new(&project, dashboard, &source)));
        }
        for slo in file.slos {
            resources.push(Resource::Slo(Slo::new(&project, slo, &source)));
        }

        projects.push(project);
    }

    Ok((projects, resources))
}
