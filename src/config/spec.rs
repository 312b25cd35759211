//! Declaration types for project files.
//!
//! These structs map to the YAML files that declare a project and its
//! monitoring resources. They are purely declarative: cross-field
//! validation happens later, when a resource's canonical payload is built.

use serde::Deserialize;
use serde_json::Value;

/// One project file: a project plus the resources it owns.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectFile {
    /// Project-level declaration.
    pub project: ProjectDecl,
    /// Alert monitors owned by this project.
    #[serde(default)]
    pub monitors: Vec<MonitorSpec>,
    /// Dashboards owned by this project.
    #[serde(default)]
    pub dashboards: Vec<DashboardSpec>,
    /// Service-level objectives owned by this project.
    #[serde(default)]
    pub slos: Vec<SloSpec>,
}

/// Project-level declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectDecl {
    /// Kennel id of the project, unique across the run.
    pub name: String,
    /// Tags applied to every resource in the project.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Declaration of one alert monitor.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSpec {
    /// Kennel id, unique within the project. Resources declared without one
    /// cannot be synchronized.
    #[serde(default)]
    pub kennel_id: Option<String>,
    /// Explicit remote id, used to adopt a pre-existing untracked monitor.
    #[serde(default)]
    pub id: Option<Value>,
    /// Monitor name.
    pub name: String,
    /// Monitor type, e.g. `query alert` or `service check`.
    #[serde(rename = "type", default = "default_monitor_type")]
    pub monitor_type: String,
    /// Alerting query.
    pub query: String,
    /// Alert message; the tracking marker is appended to this field.
    #[serde(default)]
    pub message: String,
    /// Monitor tags, merged with the project tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// OK threshold.
    #[serde(default)]
    pub ok: Option<Value>,
    /// Warning threshold.
    #[serde(default)]
    pub warning: Option<Value>,
    /// Critical threshold.
    #[serde(default)]
    pub critical: Option<Value>,
    /// Renotify interval in minutes, or `false` to disable.
    #[serde(default)]
    pub renotify_interval: Option<Value>,
    /// Whether to alert on missing data.
    #[serde(default = "default_true")]
    pub notify_no_data: bool,
    /// Minutes of missing data before a no-data alert.
    #[serde(default)]
    pub no_data_timeframe: Option<u64>,
    /// Message appended on re-notification.
    #[serde(default)]
    pub escalation_message: Option<String>,
    /// Seconds to delay evaluation.
    #[serde(default)]
    pub evaluation_delay: Option<u64>,
    /// Whether the full window must have data before alerting.
    #[serde(default)]
    pub require_full_window: Option<bool>,
    /// Whether triggering tags are included in the notification title.
    #[serde(default)]
    pub include_tags: Option<bool>,
    /// Seconds to wait before evaluating a new host.
    #[serde(default)]
    pub new_host_delay: Option<u64>,
    /// Hours before the monitor times out.
    #[serde(default)]
    pub timeout_h: Option<u64>,
    /// Whether changes to this monitor are audited.
    #[serde(default)]
    pub notify_audit: Option<bool>,
    /// Whether the monitor is locked to its creator.
    #[serde(default)]
    pub locked: Option<bool>,
}

/// Declaration of one dashboard.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardSpec {
    /// Kennel id, unique within the project.
    #[serde(default)]
    pub kennel_id: Option<String>,
    /// Explicit remote id, used to adopt a pre-existing untracked dashboard.
    #[serde(default)]
    pub id: Option<Value>,
    /// Dashboard title.
    pub title: String,
    /// Description; the tracking marker is appended to this field.
    #[serde(default)]
    pub description: String,
    /// Layout type, `ordered` or `free`.
    #[serde(default = "default_layout_type")]
    pub layout_type: String,
    /// Widget definitions, passed through structurally.
    #[serde(default)]
    pub widgets: Vec<Value>,
    /// Template variables, passed through structurally.
    #[serde(default)]
    pub template_variables: Vec<Value>,
}

/// Declaration of one service-level objective.
#[derive(Debug, Clone, Deserialize)]
pub struct SloSpec {
    /// Kennel id, unique within the project.
    #[serde(default)]
    pub kennel_id: Option<String>,
    /// Explicit remote id, used to adopt a pre-existing untracked SLO.
    #[serde(default)]
    pub id: Option<Value>,
    /// SLO name.
    pub name: String,
    /// Description; the tracking marker is appended to this field.
    #[serde(default)]
    pub description: String,
    /// SLO type, `metric` or `monitor`.
    #[serde(rename = "type")]
    pub slo_type: String,
    /// Objective thresholds, passed through structurally.
    #[serde(default)]
    pub thresholds: Vec<Value>,
    /// Metric query (required for `metric` SLOs).
    #[serde(default)]
    pub query: Option<Value>,
    /// Backing monitor ids (required for `monitor` SLOs).
    #[serde(default)]
    pub monitor_ids: Vec<Value>,
    /// SLO tags, merged with the project tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_monitor_type() -> String {
    String::from("query alert")
}

fn default_layout_type() -> String {
    String::from("ordered")
}

const fn default_true() -> bool {
    true
}
