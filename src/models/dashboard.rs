//! Dashboard definitions.

use serde_json::{Value, json};

use crate::config::DashboardSpec;
use crate::error::{ConfigError, KennelError, Result, ValidationError};
use crate::syncer::{DiffEntry, diff_values};

use super::project::Project;
use super::resource::strip_keys;

/// Layout types the API accepts.
const ALLOWED_LAYOUT_TYPES: &[&str] = &["ordered", "free"];

/// Fields the API assigns that never participate in diffing.
const READONLY_ATTRIBUTES: &[&str] = &[
    "id",
    "author_handle",
    "author_name",
    "created_at",
    "modified_at",
    "url",
    "deleted",
    "restricted_roles",
    "notify_list",
];

/// A declared dashboard.
#[derive(Debug, Clone)]
pub struct Dashboard {
    project_id: String,
    source: String,
    spec: DashboardSpec,
    json: Option<Value>,
}

impl Dashboard {
    /// Creates a dashboard owned by `project`, declared in `source`.
    #[must_use]
    pub fn new(project: &Project, spec: DashboardSpec, source: &str) -> Self {
        Self {
            project_id: project.kennel_id.clone(),
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
                resource_type: String::from("dashboard"),
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

    /// Diffs the canonical payload against a remote dashboard.
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
        strip_widget_ids(&mut expected);
        strip_widget_ids(&mut actual);

        let entries = diff_values(&actual, &expected);
        Ok((!entries.is_empty()).then_some(entries))
    }

    fn render_json(&self) -> Result<Value> {
        let identity = format!("{}:{}", self.project_id, self.kennel_id()?);
        let fail =
            |message: String| KennelError::Validation(ValidationError::new(&identity, message));

        let spec = &self.spec;

        if spec.title.trim().is_empty() {
            return Err(fail(String::from("title must not be empty")));
        }
        if !ALLOWED_LAYOUT_TYPES.contains(&spec.layout_type.as_str()) {
            return Err(fail(format!(
                "layout_type {:?} must be one of {}",
                spec.layout_type,
                ALLOWED_LAYOUT_TYPES.join(", ")
            )));
        }

        Ok(json!({
            "title": spec.title,
            "description": spec.description,
            "layout_type": spec.layout_type,
            "widgets": spec.widgets,
            "template_variables": spec.template_variables,
        }))
    }
}

/// Removes server-assigned widget ids, recursing into group widgets.
fn strip_widget_ids(payload: &mut Value) {
    let Some(widgets) = payload.get_mut("widgets").and_then(Value::as_array_mut) else {
        return;
    };
    for widget in widgets {
        if let Some(map) = widget.as_object_mut() {
            map.remove("id");
        }
        if let Some(definition) = widget.get_mut("definition") {
            strip_widget_ids(definition);
        }
    }
}
