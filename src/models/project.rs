//! Project declarations.

/// A declared project: owns resources and contributes its tag set to them.
///
/// The synchronization engine only consumes the project's kennel id; tags
/// are merged into each owned resource's payload when it is built.
#[derive(Debug, Clone)]
pub struct Project {
    /// Kennel id of the project, unique across the run.
    pub kennel_id: String,
    /// Tags applied to every resource in the project.
    pub tags: Vec<String>,
}

impl Project {
    /// Creates a new project.
    #[must_use]
    pub fn new(kennel_id: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            kennel_id: kennel_id.into(),
            tags,
        }
    }
}
