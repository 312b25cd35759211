//! Tracking-marker identity for remote resources.
//!
//! Every resource kennel manages carries a generated marker inside one
//! designated free-text field of its remote payload (the alert message for
//! monitors, the description for dashboards and SLOs). The marker links the
//! remote object back to its `project:resource` declaration, so no state
//! needs to be persisted between runs.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Sentinel substring shared by every generated marker.
///
/// Text containing this sentinel that does not parse under the full marker
/// grammar is a foreign or copy-pasted marker and must be rejected rather
/// than adopted.
pub const MARKER_SENTINEL: &str = "-- Managed by kennel";

/// Full marker grammar, anchored at the end of the identity field.
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)\A(?:.*\n)?-- Managed by kennel ([A-Za-z0-9_.-]+):([A-Za-z0-9_.-]+) in (\S+), do not modify manually\s*\z",
    )
    .unwrap_or_else(|e| panic!("marker grammar is invalid: {e}"))
});

/// The `project:resource` identity extracted from or embedded into a marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackingId {
    /// Kennel id of the owning project.
    pub project_id: String,
    /// Kennel id of the resource within the project.
    pub resource_id: String,
}

impl TrackingId {
    /// Creates a tracking id from its two parts.
    #[must_use]
    pub fn new(project_id: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            resource_id: resource_id.into(),
        }
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project_id, self.resource_id)
    }
}

/// Renders the marker line for the given identity and declaration source.
#[must_use]
pub fn marker(id: &TrackingId, source: &str) -> String {
    format!("-- Managed by kennel {id} in {source}, do not modify manually")
}

/// Appends the marker to `text` on its own line, preserving prior content.
#[must_use]
pub fn embed(id: &TrackingId, source: &str, text: &str) -> String {
    let line = marker(id, source);
    if text.is_empty() {
        line
    } else {
        format!("{text}\n{line}")
    }
}

/// Extracts the tracking id when `text` ends with a marker matching the
/// exact generated grammar. Returns `None` for untracked text.
///
/// A `None` result does not mean the text is clean: callers must also check
/// [`contains_marker`] to distinguish unmanaged resources from foreign
/// markers that require a conflict error.
#[must_use]
pub fn extract(text: &str) -> Option<TrackingId> {
    let caps = MARKER_RE.captures(text)?;
    Some(TrackingId::new(&caps[1], &caps[2]))
}

/// Returns true when the text contains marker-shaped content, whether or
/// not it parses under the generated grammar.
#[must_use]
pub fn contains_marker(text: &str) -> bool {
    text.contains(MARKER_SENTINEL)
}
