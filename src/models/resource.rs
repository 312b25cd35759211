//! The shared resource contract.
//!
//! Every declared resource supports the same capability set: a kennel id,
//! a memoized canonical JSON payload (`build_json`), a type-aware diff
//! against remote state, and a platform UI link. Per-type behavior is
//! dispatched over the closed [`Resource`] enum rather than open-ended
//! subclassing.

use serde_json::Value;

use crate::datadog::ResourceType;
use crate::error::Result;
use crate::syncer::DiffEntry;
use crate::tracking::TrackingId;

use super::dashboard::Dashboard;
use super::monitor::Monitor;
use super::slo::Slo;

/// A declared resource, as authored in configuration.
///
/// Constructed once per run from declarations, validated lazily when its
/// payload is built, and discarded after apply.
#[derive(Debug, Clone)]
pub enum Resource {
    /// Alert monitor.
    Monitor(Monitor),
    /// Dashboard.
    Dashboard(Dashboard),
    /// Service-level objective.
    Slo(Slo),
}

impl Resource {
    /// Type tag of this resource.
    #[must_use]
    pub const fn resource_type(&self) -> ResourceType {
        match self {
            Self::Monitor(_) => ResourceType::Monitor,
            Self::Dashboard(_) => ResourceType::Dashboard,
            Self::Slo(_) => ResourceType::Slo,
        }
    }

    /// Kennel id of the owning project.
    #[must_use]
    pub fn project_id(&self) -> &str {
        match self {
            Self::Monitor(m) => m.project_id(),
            Self::Dashboard(d) => d.project_id(),
            Self::Slo(s) => s.project_id(),
        }
    }

    /// Kennel id of the resource within its project.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the declaration carries no
    /// kennel id; such a resource cannot be synchronized.
    pub fn kennel_id(&self) -> Result<&str> {
        match self {
            Self::Monitor(m) => m.kennel_id(),
            Self::Dashboard(d) => d.kennel_id(),
            Self::Slo(s) => s.kennel_id(),
        }
    }

    /// The `project:resource` tracking identity.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the kennel id is unset.
    pub fn tracking_id(&self) -> Result<TrackingId> {
        Ok(TrackingId::new(self.project_id(), self.kennel_id()?))
    }

    /// Explicit remote id, set to adopt a pre-existing untracked object.
    #[must_use]
    pub fn remote_id(&self) -> Option<String> {
        match self {
            Self::Monitor(m) => m.remote_id(),
            Self::Dashboard(d) => d.remote_id(),
            Self::Slo(s) => s.remote_id(),
        }
    }

    /// Path of the declaration file, recorded in the tracking marker.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Monitor(m) => m.source(),
            Self::Dashboard(d) => d.source(),
            Self::Slo(s) => s.source(),
        }
    }

    /// Builds the canonical payload, validating on first call and
    /// memoizing for the lifetime of the resource. Repeated calls return
    /// the same mutable structure, so the planning layer may annotate it
    /// (tracking marker, merged-back id).
    ///
    /// # Errors
    ///
    /// Returns a validation error carrying the resource's
    /// `project:resource` identity.
    pub fn build_json(&mut self) -> Result<&mut Value> {
        match self {
            Self::Monitor(m) => m.build_json(),
            Self::Dashboard(d) => d.build_json(),
            Self::Slo(s) => s.build_json(),
        }
    }

    /// Computes the structural diff against a remote payload, applying the
    /// per-type exclusion rules. Returns `None` when no meaningful
    /// difference exists.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the canonical payload cannot be built.
    pub fn diff(&mut self, remote: &Value) -> Result<Option<Vec<DiffEntry>>> {
        match self {
            Self::Monitor(m) => m.diff(remote),
            Self::Dashboard(d) => d.diff(remote),
            Self::Slo(s) => s.diff(remote),
        }
    }

    /// Returns the platform UI location of the resource.
    #[must_use]
    pub fn url(&self, remote_id: &str, subdomain: Option<&str>) -> String {
        let path = match self {
            Self::Monitor(_) => format!("/monitors/{remote_id}"),
            Self::Dashboard(_) => format!("/dashboard/{remote_id}"),
            Self::Slo(_) => format!("/slo?slo_id={remote_id}"),
        };
        platform_url(subdomain, &path)
    }
}

/// Renders a UI path, absolute when a subdomain is configured.
#[must_use]
pub fn platform_url(subdomain: Option<&str>, path: &str) -> String {
    subdomain.map_or_else(
        || path.to_string(),
        |sub| format!("https://{sub}.datadoghq.com{path}"),
    )
}

/// Removes the given top-level keys from a JSON object in place.
pub(crate) fn strip_keys(value: &mut Value, keys: &[&str]) {
    if let Some(map) = value.as_object_mut() {
        for key in keys {
            map.remove(*key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectFile;
    use crate::error::{ConfigError, KennelError};
    use crate::models::Project;

    #[test]
    fn tracking_id_requires_a_kennel_id() {
        let yaml = r#"
project:
  name: a
monitors:
  - name: "m"
    query: "avg(last_5m):x > 1"
    critical: 1
"#;
        let file: ProjectFile = serde_yaml::from_str(yaml).unwrap();
        let project = Project::new(&file.project.name, vec![]);
        let resource = Resource::Monitor(Monitor::new(&project, file.monitors[0].clone(), "a.yaml"));
        assert!(matches!(
            resource.tracking_id().unwrap_err(),
            KennelError::Config(ConfigError::MissingKennelId { .. })
        ));
    }

    #[test]
    fn url_is_relative_without_a_subdomain() {
        assert_eq!(platform_url(None, "/monitors/7"), "/monitors/7");
    }

    #[test]
    fn url_is_absolute_with_a_subdomain() {
        assert_eq!(
            platform_url(Some("acme"), "/monitors/7"),
            "https://acme.datadoghq.com/monitors/7"
        );
    }
}
