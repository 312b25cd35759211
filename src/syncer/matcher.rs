//! Resolution of declared resources against remote state.
//!
//! Every declared resource is matched to at most one remote object, by
//! tracking marker first and by explicit remote id second. Remote objects
//! that carry a marker but match no declaration become delete candidates.

use std::collections::{HashMap, HashSet};

use crate::datadog::{RemoteComponent, ResourceType};
use crate::error::{IdentityConflictError, KennelError, LookupError, Result};
use crate::models::Resource;
use crate::tracking::{self, TrackingId};

/// A declared resource paired with the remote object it tracks.
#[derive(Debug)]
pub struct MatchedPair {
    /// The declared resource.
    pub resource: Resource,
    /// The remote object it resolved to.
    pub remote: RemoteComponent,
    /// True when resolved through an explicit id rather than a marker.
    pub adopted: bool,
}

/// A tracked remote object with no surviving declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCandidate {
    /// Type of the remote object.
    pub resource_type: ResourceType,
    /// Remote id to delete.
    pub remote_id: String,
    /// Identity recorded in its marker.
    pub tracking_id: TrackingId,
    /// Position in the fetched listing, used for stable ordering.
    pub listing_index: usize,
}

/// Outcome of matching declarations against remote state.
#[derive(Debug)]
pub struct MatchResult {
    /// Declarations that resolved to a remote object.
    pub matched: Vec<MatchedPair>,
    /// Declarations with no remote counterpart; they will be created.
    pub unmatched: Vec<Resource>,
    /// Tracked remotes with no declaration; they will be deleted.
    pub deletes: Vec<DeleteCandidate>,
}

/// Matches declared resources against downloaded remote components.
///
/// `project_filter` restricts deletion to remotes tracked under the given
/// project; creation and update sets are expected to be pre-filtered by the
/// caller.
///
/// # Errors
///
/// Returns an error when a remote identity field carries a malformed or
/// foreign marker, when two declarations share a tracking id, or when an
/// explicit remote id cannot be found.
pub fn match_resources(
    resources: Vec<Resource>,
    remotes: Vec<RemoteComponent>,
    project_filter: Option<&str>,
) -> Result<MatchResult> {
    // Slot holders let a remote be claimed exactly once. A marker that
    // contains the sentinel but fails the grammar is poison: syncing over
    // it could silently capture someone else's resource.
    let mut slots: Vec<Option<RemoteComponent>> = Vec::with_capacity(remotes.len());
    let mut tracked: HashMap<(ResourceType, String), usize> = HashMap::new();
    let mut by_id: HashMap<(ResourceType, String), usize> = HashMap::new();

    for (slot, remote) in remotes.into_iter().enumerate() {
        let identity = remote.identity_text();
        match tracking::extract(identity) {
            Some(id) => {
                // First occurrence wins; later duplicates stay unclaimed
                // and fall through to the delete set.
                tracked
                    .entry((remote.resource_type, id.to_string()))
                    .or_insert(slot);
            }
            None if tracking::contains_marker(identity) => {
                return Err(KennelError::IdentityConflict(IdentityConflictError {
                    resource_type: remote.resource_type.to_string(),
                    remote_id: remote.id.clone(),
                    field: remote.resource_type.identity_field().to_string(),
                }));
            }
            None => {}
        }
        by_id.insert((remote.resource_type, remote.id.clone()), slot);
        slots.push(Some(remote));
    }

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();

    for resource in resources {
        let tracking_id = resource.tracking_id()?.to_string();
        if !seen_ids.insert(tracking_id.clone()) {
            return Err(KennelError::Lookup(LookupError::DuplicateTrackingId {
                id: tracking_id,
            }));
        }

        let resource_type = resource.resource_type();

        if let Some(&slot) = tracked.get(&(resource_type, tracking_id.clone())) {
            if let Some(remote) = slots[slot].take() {
                matched.push(MatchedPair {
                    resource,
                    remote,
                    adopted: false,
                });
                continue;
            }
        }

        if let Some(explicit_id) = resource.remote_id() {
            let slot = by_id
                .get(&(resource_type, explicit_id.clone()))
                .copied()
                .and_then(|slot| slots[slot].take());
            let Some(remote) = slot else {
                return Err(KennelError::Lookup(LookupError::RemoteIdNotFound {
                    resource_type: resource_type.to_string(),
                    id: explicit_id,
                }));
            };
            matched.push(MatchedPair {
                resource,
                remote,
                adopted: true,
            });
            continue;
        }

        unmatched.push(resource);
    }

    let mut deletes = Vec::new();
    for remote in slots.into_iter().flatten() {
        let Some(tracking_id) = tracking::extract(remote.identity_text()) else {
            continue;
        };
        if project_filter.is_some_and(|filter| tracking_id.project_id != filter) {
            continue;
        }
        deletes.push(DeleteCandidate {
            resource_type: remote.resource_type,
            remote_id: remote.id,
            tracking_id,
            listing_index: remote.listing_index,
        });
    }

    Ok(MatchResult {
        matched,
        unmatched,
        deletes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectFile;
    use crate::models::{Monitor, Project};
    use serde_json::json;

    fn monitor(project: &str, kennel_id: &str, explicit_id: Option<u64>) -> Resource {
        let id_line = explicit_id.map_or(String::new(), |id| format!("    id: {id}\n"));
        let yaml = format!(
            "project:\n  name: {project}\nmonitors:\n  - kennel_id: {kennel_id}\n{id_line}    name: \"m\"\n    query: \"avg(last_5m):x > 1\"\n    critical: 1\n"
        );
        let file: ProjectFile = serde_yaml::from_str(&yaml).unwrap();
        let proj = Project::new(&file.project.name, vec![]);
        Resource::Monitor(Monitor::new(&proj, file.monitors[0].clone(), "a.yaml"))
    }

    fn tracked_remote(id: u64, index: usize, project: &str, resource: &str) -> RemoteComponent {
        let marker = tracking::marker(&TrackingId::new(project, resource), "a.yaml");
        RemoteComponent::from_payload(
            ResourceType::Monitor,
            index,
            json!({"id": id, "message": format!("hello\n{marker}")}),
        )
        .unwrap()
    }

    fn untracked_remote(id: u64, index: usize) -> RemoteComponent {
        RemoteComponent::from_payload(
            ResourceType::Monitor,
            index,
            json!({"id": id, "message": "plain message"}),
        )
        .unwrap()
    }

    #[test]
    fn marker_matches_declaration_to_remote() {
        let result = match_resources(
            vec![monitor("a", "b", None)],
            vec![tracked_remote(7, 0, "a", "b")],
            None,
        )
        .unwrap();
        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].remote.id, "7");
        assert!(!result.matched[0].adopted);
        assert!(result.unmatched.is_empty());
        assert!(result.deletes.is_empty());
    }

    #[test]
    fn undeclared_resources_are_created() {
        let result = match_resources(vec![monitor("a", "b", None)], vec![], None).unwrap();
        assert!(result.matched.is_empty());
        assert_eq!(result.unmatched.len(), 1);
    }

    #[test]
    fn orphaned_tracked_remotes_are_deleted() {
        let result = match_resources(vec![], vec![tracked_remote(7, 0, "a", "gone")], None).unwrap();
        assert_eq!(
            result.deletes,
            vec![DeleteCandidate {
                resource_type: ResourceType::Monitor,
                remote_id: "7".to_string(),
                tracking_id: TrackingId::new("a", "gone"),
                listing_index: 0,
            }]
        );
    }

    #[test]
    fn untracked_remotes_are_never_deleted() {
        let result = match_resources(vec![], vec![untracked_remote(7, 0)], None).unwrap();
        assert!(result.deletes.is_empty());
    }

    #[test]
    fn project_filter_protects_foreign_orphans() {
        let result = match_resources(
            vec![],
            vec![
                tracked_remote(7, 0, "a", "gone"),
                tracked_remote(8, 1, "other", "gone"),
            ],
            Some("a"),
        )
        .unwrap();
        assert_eq!(result.deletes.len(), 1);
        assert_eq!(result.deletes[0].remote_id, "7");
    }

    #[test]
    fn duplicate_declared_tracking_ids_are_fatal() {
        let err = match_resources(
            vec![monitor("a", "b", None), monitor("a", "b", None)],
            vec![],
            None,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Lookup a:b is duplicated");
    }

    #[test]
    fn duplicate_remote_markers_keep_first_and_delete_the_rest() {
        let result = match_resources(
            vec![monitor("a", "b", None)],
            vec![tracked_remote(7, 0, "a", "b"), tracked_remote(8, 1, "a", "b")],
            None,
        )
        .unwrap();
        assert_eq!(result.matched[0].remote.id, "7");
        assert_eq!(result.deletes.len(), 1);
        assert_eq!(result.deletes[0].remote_id, "8");
    }

    #[test]
    fn explicit_id_adopts_an_untracked_remote() {
        let result = match_resources(
            vec![monitor("a", "b", Some(7))],
            vec![untracked_remote(7, 0)],
            None,
        )
        .unwrap();
        assert_eq!(result.matched.len(), 1);
        assert!(result.matched[0].adopted);
    }

    #[test]
    fn missing_explicit_id_is_fatal() {
        let err = match_resources(vec![monitor("a", "b", Some(99))], vec![], None).unwrap_err();
        assert_eq!(err.to_string(), "Unable to find existing monitor with id 99");
    }

    #[test]
    fn malformed_marker_is_an_identity_conflict() {
        let remote = RemoteComponent::from_payload(
            ResourceType::Monitor,
            0,
            json!({"id": 7, "message": "-- Managed by kennel broken marker"}),
        )
        .unwrap();
        let err = match_resources(vec![], vec![remote], None).unwrap_err();
        assert!(matches!(err, KennelError::IdentityConflict(_)));
    }
}
