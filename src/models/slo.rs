//! Service-level objective definitions.

use serde_json::{Value, json};

use crate::config::SloSpec;
use crate::error::{ConfigError, KennelError, Result, ValidationError};
use crate::syncer::{DiffEntry, diff_values};

use super::project::Project;
use super::resource::strip_keys;

/// SLO types the API accepts.
const ALLOWED_SLO_TYPES: &[&str] = &["metric", "monitor"];

/// Fields the API assigns that never participate in diffing.
const READONLY_ATTRIBUTES: &[&str] =
    &["id", "creator", "created_at", "modified_at", "monitor_tags"];

/// A declared service-level objective.
#[derive(Debug, Clone)]
pub struct Slo {
    project_id: String,
    project_tags: Vec<String>,
    source: String,
    spec: SloSpec,
    json: Option<Value>,
}

impl Slo {
    /// Creates an SLO owned by `project`, declared in `source`.
    #[must_use]
    pub fn new(project: &Project, spec: SloSpec, source: &str) -> Self {
        Self {
            project_id: project.kennel_id.clone(),
            project_tags: project.tags.clone(),
            source: source.to_string(),
            spec,
            json: None,
        }
    }

    /// Kennel id of the owning project.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Kennel id within the project.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when unset.
    pub fn kennel_id(&self) -> Result<&str> {
        self.spec.kennel_id.as_deref().ok_or_else(|| {
            KennelError::Config(ConfigError::MissingKennelId {
                resource_type: String::from("slo"),
                project: self.project_id.clone(),
            })
        })
    }

    /// Explicit remote id for adoption.
    #[must_use]
    pub fn remote_id(&self) -> Option<String> {
        self.spec.id.as_ref().and_then(crate::datadog::id_from_value)
    }

    /// Declaration source path.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Builds the canonical payload, memoized after the first call.
    ///
    /// # Errors
    ///
    /// Returns a validation error on the first call if any rule fails.
    pub fn build_json(&mut self) -> Result<&mut Value> {
        if self.json.is_none() {
            self.json = Some(self.render_json()?);
        }
        match self.json.as_mut() {
            Some(json) => Ok(json),
            None => unreachable!("payload memoized above"),
        }
    }

    /// Diffs the canonical payload against a remote SLO.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the canonical payload cannot be built.
    pub fn diff(&mut self, remote: &Value) -> Result<Option<Vec<DiffEntry>>> {
        if remote.get("deleted").and_then(Value::as_bool) == Some(true) {
            return Ok(None);
        }

        let mut expected = self.build_json()?.clone();
        strip_keys(&mut expected, &["id"]);
        let mut actual = remote.clone();
        strip_keys(&mut actual, READONLY_ATTRIBUTES);
        strip_threshold_displays(&mut actual);
        strip_threshold_displays(&mut expected);

        let entries = diff_values(&actual, &expected);
        Ok((!entries.is_empty()).then_some(entries))
    }

    fn render_json(&self) -> Result<Value> {
        let identity = format!("{}:{}", self.project_id, self.kennel_id()?);
        let fail =
            |message: String| KennelError::Validation(ValidationError::new(&identity, message));

        let spec = &self.spec;

        if !ALLOWED_SLO_TYPES.contains(&spec.slo_type.as_str()) {
            return Err(fail(format!(
                "type {:?} must be one of {}",
                spec.slo_type,
                ALLOWED_SLO_TYPES.join(", ")
            )));
        }
        if spec.thresholds.is_empty() {
            return Err(fail(String::from("thresholds must not be empty")));
        }

        let mut tags = self.project_tags.clone();
        tags.extend(spec.tags.iter().cloned());

        let mut payload = json!({
            "name": spec.name,
            "description": spec.description,
            "type": spec.slo_type,
            "thresholds": spec.thresholds,
            "tags": tags,
        });

        match spec.slo_type.as_str() {
            "monitor" => {
                if spec.monitor_ids.is_empty() {
                    return Err(fail(String::from(
                        "type \"monitor\" requires monitor_ids",
                    )));
                }
                payload["monitor_ids"] = json!(spec.monitor_ids);
            }
            _ => {
                let Some(query) = &spec.query else {
                    return Err(fail(String::from("type \"metric\" requires query")));
                };
                payload["query"] = query.clone();
            }
        }

        Ok(payload)
    }
}

/// Removes the display-formatted threshold duplicates the API adds.
fn strip_threshold_displays(payload: &mut Value) {
    let Some(thresholds) = payload.get_mut("thresholds").and_then(Value::as_array_mut) else {
        return;
    };
    for threshold in thresholds {
        if let Some(map) = threshold.as_object_mut() {
            map.remove("warning_display");
            map.remove("target_display");
        }
    }
}
