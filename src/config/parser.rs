//! Loader for project declaration files.
//!
//! Declarations live in YAML files, one project per file. A path given on
//! the command line may be a single file or a directory; directories are
//! walked in sorted order so runs are deterministic.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, KennelError, Result};

use super::spec::ProjectFile;

/// Default directory searched for project files.
pub const DEFAULT_PROJECTS_DIR: &str = "projects";

/// Parser for project declaration files.
#[derive(Debug, Default)]
pub struct ConfigParser;

impl ConfigParser {
    /// Creates a new parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Loads every project file under `path`.
    ///
    /// Returns `(source, declaration)` pairs; `source` is the path recorded
    /// in each resource's tracking marker.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or any file fails to
    /// parse.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Vec<(String, ProjectFile)>> {
        let path = path.as_ref();

        if path.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(std::result::Result::ok)
                .map(|entry| entry.path())
                .filter(|p| {
                    p.extension()
                        .is_some_and(|ext| ext == "yaml" || ext == "yml")
                })
                .collect();
            files.sort();

            let mut projects = Vec::with_capacity(files.len());
            for file in files {
                projects.push(self.load_file(&file)?);
            }
            Ok(projects)
        } else if path.exists() {
            Ok(vec![self.load_file(path)?])
        } else {
            Err(KennelError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }))
        }
    }

    /// Loads a single project file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<(String, ProjectFile)> {
        let path = path.as_ref();
        info!("Loading declaration from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            KennelError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        let file = self.parse_yaml(&content, Some(path))?;
        Ok((path.display().to_string(), file))
    }

    /// Parses a declaration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<ProjectFile> {
        debug!("Parsing YAML declaration");

        let file: ProjectFile = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            KennelError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!("Parsed declaration for project: {}", file.project.name);
        Ok(file)
    }

    /// Loads the `.env` file from the working directory if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = PathBuf::from(".env");

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                KennelError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_project() {
        let yaml = r"
project:
  name: gateway
";
        let parser = ConfigParser::new();
        let file = parser.parse_yaml(yaml, None).unwrap();
        assert_eq!(file.project.name, "gateway");
        assert!(file.monitors.is_empty());
    }

    #[test]
    fn parse_full_project() {
        let yaml = r#"
project:
  name: gateway
  tags:
    - team:core

monitors:
  - kennel_id: cpu-high
    name: "Gateway CPU high"
    type: query alert
    query: "avg(last_5m):avg:system.cpu{service:gateway} > 90"
    critical: 90
    message: "CPU is running hot"
    tags:
      - service:gateway

dashboards:
  - kennel_id: overview
    title: "Gateway overview"
    widgets:
      - definition:
          type: timeseries

slos:
  - kennel_id: availability
    name: "Gateway availability"
    type: monitor
    monitor_ids: [123]
    thresholds:
      - timeframe: 30d
        target: 99.9
"#;
        let parser = ConfigParser::new();
        let file = parser.parse_yaml(yaml, None).unwrap();
        assert_eq!(file.project.tags, vec!["team:core"]);
        assert_eq!(file.monitors.len(), 1);
        assert_eq!(file.monitors[0].monitor_type, "query alert");
        assert_eq!(file.dashboards.len(), 1);
        assert_eq!(file.slos.len(), 1);
    }

    #[test]
    fn load_walks_directories_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.yaml", "a.yaml"] {
            std::fs::write(
                dir.path().join(name),
                format!("project:\n  name: {}\n", name.trim_end_matches(".yaml")),
            )
            .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let parser = ConfigParser::new();
        let loaded = parser.load(dir.path()).unwrap();
        let names: Vec<&str> = loaded.iter().map(|(_, f)| f.project.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn missing_path_is_a_config_error() {
        let parser = ConfigParser::new();
        let err = parser.load("does-not-exist.yaml").unwrap_err();
        assert!(matches!(
            err,
            KennelError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
