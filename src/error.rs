//! Error types for the kennel synchronization engine.
//!
//! This module provides the error hierarchy for all phases of a run:
//! loading declarations, building canonical payloads, matching against
//! remote state, planning, and applying the plan.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for kennel operations.
#[derive(Debug, Error)]
pub enum KennelError {
    /// Declaration/configuration errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Resource payload validation errors.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A remote resource carries a tracking marker this tool did not generate.
    #[error("{0}")]
    IdentityConflict(#[from] IdentityConflictError),

    /// Declared-to-remote resolution errors.
    #[error("{0}")]
    Lookup(#[from] LookupError),

    /// The requested project filter matches no declared project.
    #[error("{0}")]
    ProjectFilter(#[from] ProjectFilterError),

    /// Datadog API errors.
    #[error("Datadog API error: {0}")]
    Remote(#[from] RemoteError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Declaration/configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The declaration file or directory was not found.
    #[error("Declaration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// A declaration file could not be parsed.
    #[error("Failed to parse declaration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },

    /// A declared resource has no kennel id.
    #[error("{resource_type} in project {project} has no kennel_id")]
    MissingKennelId {
        /// Type of the resource (monitor, dashboard, slo).
        resource_type: String,
        /// Project the resource belongs to.
        project: String,
    },
}

/// A resource payload failed validation while being built.
///
/// Always fatal for the run; the message carries the resource's
/// `project:resource` identity as its prefix.
#[derive(Debug, Error)]
#[error("{resource} {message}")]
pub struct ValidationError {
    /// The `project:resource` identity of the failing resource.
    pub resource: String,
    /// Description of the violation.
    pub message: String,
}

/// A remote resource's identity field contains marker-shaped text that was
/// not produced by this tool (for example, copied from another resource).
#[derive(Debug, Error)]
#[error(
    "{resource_type} {remote_id} contains a tracking marker that kennel did not generate; \
     remove the '-- Managed by kennel' text from its {field} before this resource can be tracked"
)]
pub struct IdentityConflictError {
    /// Type of the offending remote resource.
    pub resource_type: String,
    /// Remote id of the offending resource.
    pub remote_id: String,
    /// The identity field that carries the foreign marker.
    pub field: String,
}

/// Declared-to-remote resolution errors.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Two declared resources share the same tracking id.
    #[error("Lookup {id} is duplicated")]
    DuplicateTrackingId {
        /// The duplicated `project:resource` id.
        id: String,
    },

    /// A declared resource names an explicit remote id that does not exist.
    #[error("Unable to find existing {resource_type} with id {id}")]
    RemoteIdNotFound {
        /// Type of the resource.
        resource_type: String,
        /// The explicit id that could not be found.
        id: String,
    },
}

/// The requested project filter matches no declared project.
#[derive(Debug, Error)]
#[error("Project {filter} not found, valid projects: {}", available.join(", "))]
pub struct ProjectFilterError {
    /// The filter value that matched nothing.
    pub filter: String,
    /// All declared project ids.
    pub available: Vec<String>,
}

/// Datadog API errors.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Authentication failed.
    #[error("authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// API request failed with a non-success status.
    #[error("request failed: {status} - {message}")]
    ApiRequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Rate limited by the API.
    #[error("rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Network error.
    #[error("network error: {message}")]
    NetworkError {
        /// Description of the network error.
        message: String,
    },

    /// The API returned a response that could not be interpreted.
    #[error("invalid response: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Result type alias for kennel operations.
pub type Result<T> = std::result::Result<T, KennelError>;

impl KennelError {
    /// Returns true if this error is retryable by the transport layer.
    ///
    /// Retry never belongs to the core engine; only the HTTP client
    /// consults this.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Remote(RemoteError::RateLimited { .. } | RemoteError::NetworkError { .. })
        )
    }
}

impl ValidationError {
    /// Creates a validation error for the given resource identity.
    #[must_use]
    pub fn new(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            message: message.into(),
        }
    }
}

impl RemoteError {
    /// Creates an API request error.
    #[must_use]
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiRequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Creates an invalid-response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}
