//! Resource-type metadata and remote-state wrapper types.

use serde_json::Value;

/// The closed set of resource types kennel manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// Alert monitor.
    Monitor,
    /// Dashboard.
    Dashboard,
    /// Service-level objective.
    Slo,
}

impl ResourceType {
    /// All managed types, in download order.
    pub const ALL: [Self; 3] = [Self::Monitor, Self::Dashboard, Self::Slo];

    /// API path segment for this type.
    #[must_use]
    pub const fn api_resource(self) -> &'static str {
        match self {
            Self::Monitor => "monitor",
            Self::Dashboard => "dashboard",
            Self::Slo => "slo",
        }
    }

    /// The free-text payload field that carries the tracking marker.
    #[must_use]
    pub const fn identity_field(self) -> &'static str {
        match self {
            Self::Monitor => "message",
            Self::Dashboard | Self::Slo => "description",
        }
    }

    /// Delete-phase priority. Dashboards and SLOs may reference monitors,
    /// so they must be removed first.
    #[must_use]
    pub const fn delete_priority(self) -> u8 {
        match self {
            Self::Dashboard => 0,
            Self::Slo => 1,
            Self::Monitor => 2,
        }
    }

    /// Key of the envelope the list endpoint wraps its results in, if any.
    /// Monitors arrive as a bare array.
    #[must_use]
    pub const fn list_envelope(self) -> Option<&'static str> {
        match self {
            Self::Monitor => None,
            Self::Dashboard => Some("dashboards"),
            Self::Slo => Some("data"),
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.api_resource())
    }
}

/// A resource instance as currently stored by the monitoring platform.
///
/// Fetched once per type at the start of a run and never mutated locally;
/// the executor's API calls are the only source of remote mutation.
#[derive(Debug, Clone)]
pub struct RemoteComponent {
    /// Type of the resource.
    pub resource_type: ResourceType,
    /// Remote id, normalized to a string (monitor ids are numeric).
    pub id: String,
    /// Position in the fetched listing; first occurrence wins on duplicates.
    pub listing_index: usize,
    /// Raw JSON payload as returned by the API.
    pub payload: Value,
}

impl RemoteComponent {
    /// Wraps a raw list element, extracting its id.
    #[must_use]
    pub fn from_payload(resource_type: ResourceType, listing_index: usize, payload: Value) -> Option<Self> {
        let id = id_from_value(payload.get("id")?)?;
        Some(Self {
            resource_type,
            id,
            listing_index,
            payload,
        })
    }

    /// The text of the identity field, empty when absent.
    #[must_use]
    pub fn identity_text(&self) -> &str {
        self.payload
            .get(self.resource_type.identity_field())
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

/// Normalizes a JSON id (number for monitors, string elsewhere) to a string.
#[must_use]
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
