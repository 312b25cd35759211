//! Alert monitor definitions.
//!
//! Monitors carry the heaviest validation rules of the resource types:
//! threshold typing, renotify allow-list, query window allow-list, and
//! the query/critical consistency check. All validation runs when the
//! canonical payload is built, never at construction, so cross-field
//! checks see every resolved input.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value, json};

use crate::config::MonitorSpec;
use crate::error::{ConfigError, KennelError, Result, ValidationError};
use crate::syncer::{DiffEntry, diff_values};

use super::project::Project;
use super::resource::strip_keys;

/// Monitor type the API has deprecated in favor of `query alert`.
const DEPRECATED_MONITOR_TYPE: &str = "metric alert";

/// Allowed `renotify_interval` values, in minutes.
const ALLOWED_RENOTIFY_INTERVALS: &[u64] =
    &[0, 10, 20, 30, 40, 50, 60, 90, 120, 180, 240, 300, 360, 720, 1440];

/// Allowed rollup windows for `query alert` queries.
const ALLOWED_QUERY_WINDOWS: &[&str] = &["1m", "5m", "10m", "15m", "30m", "1h", "2h", "4h", "24h"];

/// Default minutes of missing data before a no-data alert.
const DEFAULT_NO_DATA_TIMEFRAME: u64 = 60;

/// Fields the API assigns that never participate in diffing.
const READONLY_ATTRIBUTES: &[&str] = &[
    "id",
    "org_id",
    "overall_state",
    "overall_state_modified",
    "matching_downtimes",
    "creator",
    "created",
    "created_at",
    "modified",
    "deleted",
    "priority",
    "restricted_roles",
];

/// The duration token inside the query's first function call, e.g. `5m` in
/// `avg(last_5m):...`.
static QUERY_WINDOW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(last_([0-9]+[a-z]+)\)").unwrap_or_else(|e| panic!("window grammar: {e}"))
});

/// The numeric literal the query compares against, anchored at its end.
static QUERY_COMPARISON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[<>]=?|==)\s*([0-9]+(?:\.[0-9]+)?)\s*$")
        .unwrap_or_else(|e| panic!("comparison grammar: {e}"))
});

/// A declared alert monitor.
#[derive(Debug, Clone)]
pub struct Monitor {
    project_id: String,
    project_tags: Vec<String>,
    source: String,
    spec: MonitorSpec,
    json: Option<Value>,
}

impl Monitor {
    /// Creates a monitor owned by `project`, declared in `source`.
    #[must_use]
    pub fn new(project: &Project, spec: MonitorSpec, source: &str) -> Self {
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
                resource_type: String::from("monitor"),
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

    /// Diffs the canonical payload against a remote monitor.
    ///
    /// A soft-deleted remote object is excluded from comparison entirely
    /// rather than triggering an update or resurrection.
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
        Self::normalize(&mut expected, &mut actual);

        let entries = diff_values(&actual, &expected);
        Ok((!entries.is_empty()).then_some(entries))
    }

    /// Builds the payload and runs every validation rule.
    fn render_json(&self) -> Result<Value> {
        let identity = format!("{}:{}", self.project_id, self.kennel_id()?);
        let fail =
            |message: String| KennelError::Validation(ValidationError::new(&identity, message));

        let spec = &self.spec;
        let monitor_type = spec.monitor_type.as_str();

        if monitor_type == DEPRECATED_MONITOR_TYPE {
            return Err(fail(format!(
                "type {DEPRECATED_MONITOR_TYPE:?} is deprecated, use \"query alert\" instead"
            )));
        }

        let thresholds = self.render_thresholds(&fail)?;

        let renotify_interval = match &spec.renotify_interval {
            None | Some(Value::Bool(false)) => 0,
            Some(value) => match value.as_u64() {
                Some(minutes) if ALLOWED_RENOTIFY_INTERVALS.contains(&minutes) => minutes,
                _ => {
                    return Err(fail(format!(
                        "renotify_interval must be one of {}",
                        join_list(ALLOWED_RENOTIFY_INTERVALS)
                    )));
                }
            },
        };

        let query = spec.query.trim();

        if monitor_type == "query alert" {
            if let Some(caps) = QUERY_WINDOW_RE.captures(query) {
                let window = &caps[1];
                if !ALLOWED_QUERY_WINDOWS.contains(&window) {
                    return Err(fail(format!(
                        "query window {window:?} must be one of {}",
                        ALLOWED_QUERY_WINDOWS.join(", ")
                    )));
                }
            }
        }

        let comparison = QUERY_COMPARISON_RE.captures(query);
        let critical = thresholds.get("critical").and_then(Value::as_f64);
        if let (Some(caps), Some(critical)) = (&comparison, critical) {
            let literal: f64 = caps[1].parse().map_err(|_| {
                fail(String::from("value used in query is not a number"))
            })?;
            if (literal - critical).abs() > f64::EPSILON {
                return Err(fail(String::from(
                    "critical and value used in query must match",
                )));
            }
        }

        // Grouping clause before the comparison operator makes this a
        // multi-alert monitor.
        let grouped_scope = comparison
            .as_ref()
            .and_then(|caps| caps.get(0))
            .map_or(query, |m| &query[..m.start()]);
        let multi = monitor_type == "query alert" && grouped_scope.contains(" by ");

        let no_data_timeframe = if spec.notify_no_data {
            json!(spec.no_data_timeframe.unwrap_or(DEFAULT_NO_DATA_TIMEFRAME))
        } else {
            Value::Null
        };

        let mut tags = self.project_tags.clone();
        tags.extend(spec.tags.iter().cloned());

        Ok(json!({
            "name": spec.name,
            "type": monitor_type,
            "query": query,
            "message": spec.message,
            "multi": multi,
            "tags": tags,
            "options": {
                "timeout_h": spec.timeout_h.unwrap_or(0),
                "notify_no_data": spec.notify_no_data,
                "no_data_timeframe": no_data_timeframe,
                "notify_audit": spec.notify_audit.unwrap_or(false),
                "require_full_window": spec.require_full_window.unwrap_or(true),
                "new_host_delay": spec.new_host_delay.unwrap_or(300),
                "include_tags": spec.include_tags.unwrap_or(true),
                "escalation_message": spec.escalation_message.clone().unwrap_or_default(),
                "evaluation_delay": spec.evaluation_delay.map_or(Value::Null, |d| json!(d)),
                "locked": spec.locked.unwrap_or(false),
                "renotify_interval": renotify_interval,
                "thresholds": Value::Object(thresholds),
            },
        }))
    }

    /// Assembles the thresholds object, enforcing per-type numeric rules.
    fn render_thresholds(
        &self,
        fail: &impl Fn(String) -> KennelError,
    ) -> Result<Map<String, Value>> {
        let spec = &self.spec;
        let service_check = spec.monitor_type == "service check";
        let mut thresholds = Map::new();

        for (name, value) in [
            ("ok", &spec.ok),
            ("warning", &spec.warning),
            ("critical", &spec.critical),
        ] {
            let Some(value) = value else { continue };

            if service_check {
                if value.is_i64() || value.is_u64() {
                    thresholds.insert(name.to_string(), value.clone());
                } else {
                    return Err(fail(format!(
                        "{name} must be an integer for type \"service check\""
                    )));
                }
            } else {
                let Some(number) = value.as_f64() else {
                    return Err(fail(format!("{name} must be a number")));
                };
                thresholds.insert(name.to_string(), json!(number));
            }
        }

        Ok(thresholds)
    }

    /// Applies the monitor-specific diff exclusions to both payloads.
    fn normalize(expected: &mut Value, actual: &mut Value) {
        strip_keys(actual, READONLY_ATTRIBUTES);

        // The API renames query alerts to metric alerts inconsistently;
        // they are the same type.
        let aliased = matches!(
            (
                expected.get("type").and_then(Value::as_str),
                actual.get("type").and_then(Value::as_str),
            ),
            (Some("query alert"), Some("metric alert"))
                | (Some("metric alert"), Some("query alert"))
        );
        if aliased {
            actual["type"] = expected["type"].clone();
        }

        let service_check =
            expected.get("type").and_then(Value::as_str) == Some("service check");

        let (Some(expected_options), Some(actual_options)) = (
            expected.get_mut("options").and_then(Value::as_object_mut),
            actual.get_mut("options").and_then(Value::as_object_mut),
        ) else {
            return;
        };

        expected_options.remove("silenced");
        actual_options.remove("silenced");

        // The remote omits these defaults rather than returning explicit
        // nulls; their absence is not a difference.
        for key in ["escalation_message", "evaluation_delay"] {
            if !actual_options.contains_key(key)
                || actual_options.get(key).is_some_and(Value::is_null)
            {
                if expected_options
                    .get(key)
                    .is_none_or(|v| v.is_null() || v == &json!(""))
                {
                    expected_options.remove(key);
                    actual_options.remove(key);
                }
            }
        }

        // The API never returns these for service checks.
        if service_check {
            for key in ["include_tags", "require_full_window"] {
                expected_options.remove(key);
                actual_options.remove(key);
            }
        }
    }
}

/// Joins numeric list items with commas for error messages.
fn join_list(items: &[u64]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
