//! The synchronization engine.
//!
//! A run flows through four stages: download remote state, match it
//! against declarations, build an ordered plan, and (after confirmation)
//! execute the plan. Everything up to execution is read-only.

mod confirm;
mod diff;
mod executor;
mod matcher;
mod plan;

pub use confirm::{Confirmation, ConfirmationGate, decide};
pub use diff::{DiffEntry, DiffKind, diff_values};
pub use executor::Executor;
pub use matcher::{DeleteCandidate, MatchResult, MatchedPair, match_resources};
pub use plan::{Action, Plan, diff_lines};

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::datadog::{DatadogApi, RemoteComponent, ResourceType};
use crate::error::{KennelError, ProjectFilterError, Result};
use crate::models::{Project, Resource};
use crate::tracking;

/// Plans and applies synchronization runs.
pub struct Syncer<'a> {
    api: &'a dyn DatadogApi,
    subdomain: Option<String>,
}

impl<'a> Syncer<'a> {
    /// Creates a syncer; `subdomain` makes reported URLs absolute.
    #[must_use]
    pub fn new(api: &'a dyn DatadogApi, subdomain: Option<String>) -> Self {
        Self { api, subdomain }
    }

    /// Builds the ordered plan for the given declarations.
    ///
    /// With a `project_filter`, only that project's resources are planned
    /// and only its orphans are deleted.
    ///
    /// # Errors
    ///
    /// Returns an error when the filter matches no declared project, a
    /// declaration fails validation, matching fails, or a download fails.
    pub async fn plan(
        &self,
        projects: &[Project],
        resources: Vec<Resource>,
        project_filter: Option<&str>,
    ) -> Result<Plan> {
        let resources = filter_resources(projects, resources, project_filter)?;

        let mut remotes = Vec::new();
        for resource_type in ResourceType::ALL {
            info!("Downloading {resource_type}s");
            let listed = self.api.list(resource_type).await?;
            debug!("Downloaded {} {resource_type}s", listed.len());
            remotes.extend(
                listed
                    .into_iter()
                    .enumerate()
                    .filter_map(|(index, payload)| {
                        RemoteComponent::from_payload(resource_type, index, payload)
                    }),
            );
        }

        let mut result = match_resources(resources, remotes, project_filter)?;

        // List endpoints return dashboard summaries without widgets; the
        // full definition is needed before diffing.
        for pair in &mut result.matched {
            if pair.remote.resource_type == ResourceType::Dashboard {
                pair.remote.payload = self
                    .api
                    .show(ResourceType::Dashboard, &pair.remote.id)
                    .await?;
            }
        }

        let mut actions = Vec::new();

        let mut deletes = result.deletes;
        deletes.sort_by_key(|d| (d.resource_type.delete_priority(), d.listing_index));
        for delete in deletes {
            actions.push(Action::Delete {
                resource_type: delete.resource_type,
                remote_id: delete.remote_id,
                tracking_id: delete.tracking_id,
            });
        }

        for mut resource in result.unmatched {
            let tracking_id = resource.tracking_id()?;
            annotate(&mut resource, None)?;
            actions.push(Action::Create {
                resource,
                tracking_id,
            });
        }

        for pair in result.matched {
            let mut resource = pair.resource;
            let tracking_id = resource.tracking_id()?;
            annotate(&mut resource, Some(pair.remote.identity_text()))?;
            if let Some(entries) = resource.diff(&pair.remote.payload)? {
                actions.push(Action::Update {
                    resource,
                    tracking_id,
                    remote_id: pair.remote.id,
                    entries,
                });
            }
        }

        Ok(Plan::new(actions))
    }

    /// Applies a confirmed plan.
    ///
    /// # Errors
    ///
    /// Returns the first failing action's error.
    pub async fn apply(&self, plan: Plan) -> Result<Vec<String>> {
        Executor::new(self.api, self.subdomain.clone())
            .execute(plan)
            .await
    }
}

/// Validates the project filter and narrows declarations to it.
fn filter_resources(
    projects: &[Project],
    resources: Vec<Resource>,
    project_filter: Option<&str>,
) -> Result<Vec<Resource>> {
    let Some(filter) = project_filter else {
        return Ok(resources);
    };

    if !projects.iter().any(|p| p.kennel_id == filter) {
        let mut available: Vec<String> =
            projects.iter().map(|p| p.kennel_id.clone()).collect();
        available.sort();
        return Err(KennelError::ProjectFilter(ProjectFilterError {
            filter: filter.to_string(),
            available,
        }));
    }

    Ok(resources
        .into_iter()
        .filter(|r| r.project_id() == filter)
        .collect())
}

/// Writes the tracking marker into the resource's identity field.
///
/// When the matched remote is tracked by a different project, the remote
/// text is kept as-is so the plan never rewrites a foreign identity.
fn annotate(resource: &mut Resource, remote_identity: Option<&str>) -> Result<()> {
    let tracking_id = resource.tracking_id()?;
    let source = resource.source().to_string();
    let field = resource.resource_type().identity_field();

    let foreign = remote_identity
        .and_then(tracking::extract)
        .is_some_and(|remote_id| remote_id.project_id != tracking_id.project_id);

    let payload = resource.build_json()?;
    let text = if foreign {
        remote_identity.unwrap_or_default().to_string()
    } else {
        let declared = payload.get(field).and_then(Value::as_str).unwrap_or("");
        tracking::embed(&tracking_id, &source, declared)
    };
    payload[field] = json!(text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectFile;
    use crate::error::LookupError;
    use crate::models::{Dashboard, Monitor};
    use crate::tracking::TrackingId;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    /// Serves canned list/show payloads.
    #[derive(Default)]
    struct CannedApi {
        lists: HashMap<&'static str, Vec<Value>>,
        details: HashMap<String, Value>,
    }

    #[async_trait]
    impl DatadogApi for CannedApi {
        async fn list(&self, resource: ResourceType) -> Result<Vec<Value>> {
            Ok(self
                .lists
                .get(resource.api_resource())
                .cloned()
                .unwrap_or_default())
        }

        async fn show(&self, _resource: ResourceType, id: &str) -> Result<Value> {
            Ok(self.details.get(id).cloned().unwrap_or(Value::Null))
        }

        async fn create(&self, _resource: ResourceType, _payload: &Value) -> Result<Value> {
            unimplemented!("planning never creates")
        }

        async fn update(&self, _r: ResourceType, _id: &str, _payload: &Value) -> Result<Value> {
            unimplemented!("planning never updates")
        }

        async fn delete(&self, _resource: ResourceType, _id: &str) -> Result<()> {
            unimplemented!("planning never deletes")
        }
    }

    fn declarations(yaml: &str) -> (Vec<Project>, Vec<Resource>) {
        let file: ProjectFile = serde_yaml::from_str(yaml).unwrap();
        let project = Project::new(&file.project.name, file.project.tags.clone());
        let mut resources = Vec::new();
        for m in file.monitors {
            resources.push(Resource::Monitor(Monitor::new(&project, m, "a.yaml")));
        }
        for d in file.dashboards {
            resources.push(Resource::Dashboard(Dashboard::new(&project, d, "a.yaml")));
        }
        (vec![project], resources)
    }

    fn marker(project: &str, resource: &str) -> String {
        tracking::marker(&TrackingId::new(project, resource), "a.yaml")
    }

    #[tokio::test]
    async fn plan_orders_deletes_before_creates() {
        let (projects, resources) = declarations(
            r#"
project:
  name: a
monitors:
  - kennel_id: new
    name: "m"
    query: "avg(last_5m):x > 1"
    critical: 1
"#,
        );

        let mut api = CannedApi::default();
        api.lists.insert(
            "monitor",
            vec![json!({"id": 7, "message": marker("a", "old-monitor")})],
        );
        api.lists.insert(
            "dashboard",
            vec![json!({"id": "d1", "description": marker("a", "old-dash")})],
        );
        api.lists.insert(
            "slo",
            vec![json!({"id": "s1", "description": marker("a", "old-slo")})],
        );

        let syncer = Syncer::new(&api, None);
        let plan = syncer.plan(&projects, resources, None).await.unwrap();

        assert_eq!(
            plan.to_string(),
            "Delete dashboard a:old-dash\nDelete slo a:old-slo\nDelete monitor a:old-monitor\nCreate monitor a:new\n"
        );
    }

    #[tokio::test]
    async fn matched_identical_resources_produce_an_empty_plan() {
        let (projects, mut resources) = declarations(
            r#"
project:
  name: a
monitors:
  - kennel_id: b
    name: "m"
    message: "cpu is hot"
    query: "avg(last_5m):x > 1"
    critical: 1
"#,
        );

        // Remote state equals the annotated payload the plan would produce.
        let mut remote = resources[0].build_json().unwrap().clone();
        remote["id"] = json!(7);
        remote["message"] = json!(tracking::embed(
            &TrackingId::new("a", "b"),
            "a.yaml",
            "cpu is hot"
        ));

        let mut api = CannedApi::default();
        api.lists.insert("monitor", vec![remote]);

        let syncer = Syncer::new(&api, None);
        let plan = syncer.plan(&projects, resources, None).await.unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.to_string(), "Nothing to do\n");
    }

    #[tokio::test]
    async fn changed_resources_are_updated_with_their_diff() {
        let (projects, mut resources) = declarations(
            r#"
project:
  name: a
monitors:
  - kennel_id: b
    name: "new name"
    query: "avg(last_5m):x > 1"
    critical: 1
"#,
        );

        let mut remote = resources[0].build_json().unwrap().clone();
        remote["id"] = json!(7);
        remote["name"] = json!("old name");
        remote["message"] = json!(tracking::embed(&TrackingId::new("a", "b"), "a.yaml", ""));

        let mut api = CannedApi::default();
        api.lists.insert("monitor", vec![remote]);

        let syncer = Syncer::new(&api, None);
        let plan = syncer.plan(&projects, resources, None).await.unwrap();

        assert_eq!(plan.actions.len(), 1);
        let Action::Update {
            remote_id, entries, ..
        } = &plan.actions[0]
        else {
            panic!("expected an update");
        };
        assert_eq!(remote_id, "7");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "name");
    }

    #[tokio::test]
    async fn dashboards_are_diffed_against_their_full_detail() {
        let (projects, resources) = declarations(
            r#"
project:
  name: a
dashboards:
  - kennel_id: overview
    title: "Overview"
    widgets:
      - definition:
          type: timeseries
"#,
        );

        let description = tracking::embed(&TrackingId::new("a", "overview"), "a.yaml", "");
        let mut api = CannedApi::default();
        // Listing omits widgets entirely.
        api.lists.insert(
            "dashboard",
            vec![json!({"id": "d1", "title": "Overview", "description": description.clone()})],
        );
        api.details.insert(
            "d1".to_string(),
            json!({
                "id": "d1",
                "title": "Overview",
                "description": description,
                "layout_type": "ordered",
                "widgets": [{"id": 55, "definition": {"type": "timeseries"}}],
                "template_variables": [],
            }),
        );

        let syncer = Syncer::new(&api, None);
        let plan = syncer.plan(&projects, resources, None).await.unwrap();
        assert!(plan.is_empty(), "{plan}");
    }

    #[tokio::test]
    async fn adopting_a_foreign_tracked_remote_keeps_its_identity_text() {
        let (projects, resources) = declarations(
            r#"
project:
  name: a
monitors:
  - kennel_id: b
    id: 7
    name: "m"
    query: "avg(last_5m):x > 1"
    critical: 1
"#,
        );

        let foreign_message = format!("theirs\n{}", marker("other", "thing"));
        let mut api = CannedApi::default();
        api.lists
            .insert(
                "monitor",
                vec![json!({"id": 7, "message": foreign_message.clone()})],
            );

        let syncer = Syncer::new(&api, None);
        let plan = syncer.plan(&projects, resources, None).await.unwrap();

        let Action::Update { mut resource, .. } = plan.actions.into_iter().next().unwrap() else {
            panic!("expected an update");
        };
        assert_eq!(
            resource.build_json().unwrap()["message"],
            json!(foreign_message)
        );
    }

    #[tokio::test]
    async fn unknown_project_filter_lists_valid_projects() {
        let (projects, resources) = declarations("project:\n  name: a\n");
        let api = CannedApi::default();
        let syncer = Syncer::new(&api, None);
        let err = syncer
            .plan(&projects, resources, Some("nope"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Project nope not found, valid projects: a");
    }

    #[tokio::test]
    async fn explicit_id_lookup_failures_surface_from_planning() {
        let (projects, resources) = declarations(
            r#"
project:
  name: a
monitors:
  - kennel_id: b
    id: 99
    name: "m"
    query: "avg(last_5m):x > 1"
    critical: 1
"#,
        );
        let api = CannedApi::default();
        let syncer = Syncer::new(&api, None);
        let err = syncer.plan(&projects, resources, None).await.unwrap_err();
        assert!(matches!(
            err,
            KennelError::Lookup(LookupError::RemoteIdNotFound { .. })
        ));
    }

    #[test]
    fn annotate_embeds_the_marker_for_new_resources() {
        let (_, mut resources) = declarations(
            r#"
project:
  name: a
monitors:
  - kennel_id: b
    name: "m"
    message: "original"
    query: "avg(last_5m):x > 1"
    critical: 1
"#,
        );
        let mut resource = resources.remove(0);
        annotate(&mut resource, None).unwrap();
        let message = resource.build_json().unwrap()["message"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(message.starts_with("original\n-- Managed by kennel a:b in a.yaml"));
    }
}
