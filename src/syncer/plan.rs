//! The ordered change plan.
//!
//! A plan is the full list of remote mutations a run intends to make:
//! deletes first (dashboards, then SLOs, then monitors, so references are
//! removed before their targets), then creates and updates in declaration
//! order.

use std::fmt;

use serde_json::Value;

use crate::datadog::ResourceType;
use crate::models::Resource;
use crate::tracking::TrackingId;

use super::diff::DiffEntry;

/// Rendered diff entries wider than this move to a three-line layout.
const MAX_INLINE_DIFF_WIDTH: usize = 100;

/// One intended remote mutation.
#[derive(Debug)]
pub enum Action {
    /// Create a new remote object from a declaration.
    Create {
        /// The declared resource, payload already annotated.
        resource: Resource,
        /// Identity of the resource.
        tracking_id: TrackingId,
    },
    /// Update an existing remote object to match its declaration.
    Update {
        /// The declared resource, payload already annotated.
        resource: Resource,
        /// Identity of the resource.
        tracking_id: TrackingId,
        /// Remote id being updated.
        remote_id: String,
        /// The differences driving this update.
        entries: Vec<DiffEntry>,
    },
    /// Delete a tracked remote object with no declaration.
    Delete {
        /// Type of the remote object.
        resource_type: ResourceType,
        /// Remote id being deleted.
        remote_id: String,
        /// Identity recorded in its marker.
        tracking_id: TrackingId,
    },
}

impl Action {
    /// Type of the resource this action touches.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Self::Create { resource, .. } | Self::Update { resource, .. } => {
                resource.resource_type()
            }
            Self::Delete { resource_type, .. } => *resource_type,
        }
    }
}

/// The ordered list of mutations a run intends to make.
#[derive(Debug, Default)]
pub struct Plan {
    /// Actions in execution order.
    pub actions: Vec<Action>,
}

impl Plan {
    /// Creates a plan over pre-ordered actions.
    #[must_use]
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    /// True when the plan contains no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "Nothing to do");
        }

        for action in &self.actions {
            match action {
                Action::Create {
                    resource,
                    tracking_id,
                } => {
                    writeln!(f, "Create {} {tracking_id}", resource.resource_type())?;
                }
                Action::Update {
                    resource,
                    tracking_id,
                    entries,
                    ..
                } => {
                    writeln!(f, "Update {} {tracking_id}", resource.resource_type())?;
                    for entry in entries {
                        for line in diff_lines(entry) {
                            writeln!(f, "  {line}")?;
                        }
                    }
                }
                Action::Delete {
                    resource_type,
                    tracking_id,
                    ..
                } => {
                    writeln!(f, "Delete {resource_type} {tracking_id}")?;
                }
            }
        }
        Ok(())
    }
}

/// Renders one diff entry, splitting wide entries across three lines.
#[must_use]
pub fn diff_lines(entry: &DiffEntry) -> Vec<String> {
    let previous = render_value(entry.previous.as_ref());
    let next = render_value(entry.next.as_ref());
    let inline = format!("{}{} {previous} -> {next}", entry.kind.sigil(), entry.path);

    if inline.len() <= MAX_INLINE_DIFF_WIDTH {
        vec![inline]
    } else {
        vec![
            entry.path.clone(),
            format!("    {previous} ->"),
            format!("    {next}"),
        ]
    }
}

/// Renders a diff value, using `nil` for an absent side.
fn render_value(value: Option<&Value>) -> String {
    value.map_or_else(|| String::from("nil"), Value::to_string)
}
