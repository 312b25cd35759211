//! Plan execution against the remote API.
//!
//! Actions run strictly in plan order and the first failure aborts the
//! run. Earlier actions stay applied; the next run re-plans from whatever
//! state the remote is actually in.

use serde_json::Value;
use tracing::info;

use crate::datadog::{DatadogApi, ResourceType, id_from_value};
use crate::error::{KennelError, RemoteError, Result};

use super::plan::{Action, Plan};

/// Executes plans sequentially against a remote API.
pub struct Executor<'a> {
    api: &'a dyn DatadogApi,
    subdomain: Option<String>,
}

impl<'a> Executor<'a> {
    /// Creates an executor; `subdomain` makes reported URLs absolute.
    #[must_use]
    pub fn new(api: &'a dyn DatadogApi, subdomain: Option<String>) -> Self {
        Self { api, subdomain }
    }

    /// Executes every action in order, returning one report line per
    /// completed action.
    ///
    /// # Errors
    ///
    /// Returns the first action's error; subsequent actions do not run.
    pub async fn execute(&self, plan: Plan) -> Result<Vec<String>> {
        let mut report = Vec::with_capacity(plan.actions.len());

        for action in plan.actions {
            match action {
                Action::Create {
                    mut resource,
                    tracking_id,
                } => {
                    let resource_type = resource.resource_type();
                    let payload = resource.build_json()?;
                    let stored = self.api.create(resource_type, payload).await?;
                    let id = merge_created_id(payload, &stored, resource_type)?;
                    let url = resource.url(&id, self.subdomain.as_deref());
                    info!("Created {resource_type} {tracking_id}");
                    report.push(format!("Created {resource_type} {tracking_id} {url}"));
                }
                Action::Update {
                    mut resource,
                    tracking_id,
                    remote_id,
                    ..
                } => {
                    let resource_type = resource.resource_type();
                    let payload = resource.build_json()?;
                    self.api.update(resource_type, &remote_id, payload).await?;
                    let url = resource.url(&remote_id, self.subdomain.as_deref());
                    info!("Updated {resource_type} {tracking_id}");
                    report.push(format!("Updated {resource_type} {tracking_id} {url}"));
                }
                Action::Delete {
                    resource_type,
                    remote_id,
                    tracking_id,
                } => {
                    self.api.delete(resource_type, &remote_id).await?;
                    info!("Deleted {resource_type} {tracking_id}");
                    report.push(format!("Deleted {resource_type} {tracking_id} {remote_id}"));
                }
            }
        }

        Ok(report)
    }
}

/// Merges the server-assigned id back into the payload so later actions in
/// the same run can reference the new object, returning it as a string for
/// URL rendering. The id keeps its original JSON shape: monitor ids are
/// numbers while dashboard and SLO ids are strings.
fn merge_created_id(
    payload: &mut Value,
    stored: &Value,
    resource_type: ResourceType,
) -> Result<String> {
    let no_id = || {
        KennelError::Remote(RemoteError::invalid_response(format!(
            "created {resource_type} response carries no id"
        )))
    };
    let id_value = stored.get("id").cloned().ok_or_else(no_id)?;
    let id = id_from_value(&id_value).ok_or_else(no_id)?;
    payload["id"] = id_value;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectFile;
    use crate::datadog::ResourceType;
    use crate::models::{Monitor, Project, Resource};
    use crate::tracking::TrackingId;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    /// Records every call; `fail_on` makes that call return an error.
    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl FakeApi {
        fn record(&self, call: String) -> Result<()> {
            let failing = self.fail_on.as_deref() == Some(call.as_str());
            self.calls.lock().unwrap().push(call);
            if failing {
                return Err(KennelError::Remote(RemoteError::api_error(500, "boom")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DatadogApi for FakeApi {
        async fn list(&self, _resource: ResourceType) -> Result<Vec<Value>> {
            Ok(vec![])
        }

        async fn show(&self, _resource: ResourceType, _id: &str) -> Result<Value> {
            Ok(Value::Null)
        }

        async fn create(&self, resource: ResourceType, _payload: &Value) -> Result<Value> {
            self.record(format!("create {resource}"))?;
            Ok(serde_json::json!({"id": 42}))
        }

        async fn update(&self, resource: ResourceType, id: &str, _payload: &Value) -> Result<Value> {
            self.record(format!("update {resource} {id}"))?;
            Ok(Value::Null)
        }

        async fn delete(&self, resource: ResourceType, id: &str) -> Result<()> {
            self.record(format!("delete {resource} {id}"))
        }
    }

    fn monitor_resource() -> Resource {
        let yaml = r#"
project:
  name: a
monitors:
  - kennel_id: b
    name: "m"
    query: "avg(last_5m):x > 1"
    critical: 1
"#;
        let file: ProjectFile = serde_yaml::from_str(yaml).unwrap();
        let project = Project::new(&file.project.name, vec![]);
        Resource::Monitor(Monitor::new(&project, file.monitors[0].clone(), "a.yaml"))
    }

    #[tokio::test]
    async fn actions_run_in_plan_order() {
        let api = FakeApi::default();
        let plan = Plan::new(vec![
            Action::Delete {
                resource_type: ResourceType::Dashboard,
                remote_id: "d1".to_string(),
                tracking_id: TrackingId::new("a", "gone"),
            },
            Action::Create {
                resource: monitor_resource(),
                tracking_id: TrackingId::new("a", "b"),
            },
        ]);

        let report = Executor::new(&api, None).execute(plan).await.unwrap();

        assert_eq!(
            *api.calls.lock().unwrap(),
            vec!["delete dashboard d1", "create monitor"]
        );
        assert_eq!(
            report,
            vec![
                "Deleted dashboard a:gone d1",
                "Created monitor a:b /monitors/42"
            ]
        );
    }

    #[tokio::test]
    async fn reported_urls_are_absolute_with_a_subdomain() {
        let api = FakeApi::default();
        let plan = Plan::new(vec![Action::Create {
            resource: monitor_resource(),
            tracking_id: TrackingId::new("a", "b"),
        }]);

        let report = Executor::new(&api, Some("acme".to_string()))
            .execute(plan)
            .await
            .unwrap();
        assert_eq!(
            report,
            vec!["Created monitor a:b https://acme.datadoghq.com/monitors/42"]
        );
    }

    #[test]
    fn created_ids_keep_their_json_shape() {
        let mut monitor = serde_json::json!({"name": "m"});
        let id = merge_created_id(
            &mut monitor,
            &serde_json::json!({"id": 42}),
            ResourceType::Monitor,
        )
        .unwrap();
        assert_eq!(id, "42");
        assert_eq!(monitor["id"], serde_json::json!(42));

        let mut dash = serde_json::json!({"title": "d"});
        let id = merge_created_id(
            &mut dash,
            &serde_json::json!({"id": "abc-def"}),
            ResourceType::Dashboard,
        )
        .unwrap();
        assert_eq!(id, "abc-def");
        assert_eq!(dash["id"], serde_json::json!("abc-def"));
    }

    #[test]
    fn created_response_without_an_id_is_invalid() {
        let mut payload = serde_json::json!({"name": "m"});
        let err = merge_created_id(
            &mut payload,
            &serde_json::json!({"ok": true}),
            ResourceType::Monitor,
        )
        .unwrap_err();
        assert!(matches!(err, KennelError::Remote(RemoteError::InvalidResponse { .. })));
    }

    #[tokio::test]
    async fn first_failure_stops_the_run() {
        let api = FakeApi {
            fail_on: Some("delete monitor m1".to_string()),
            ..FakeApi::default()
        };
        let plan = Plan::new(vec![
            Action::Delete {
                resource_type: ResourceType::Monitor,
                remote_id: "m1".to_string(),
                tracking_id: TrackingId::new("a", "x"),
            },
            Action::Delete {
                resource_type: ResourceType::Monitor,
                remote_id: "m2".to_string(),
                tracking_id: TrackingId::new("a", "y"),
            },
        ]);

        let err = Executor::new(&api, None).execute(plan).await.unwrap_err();
        assert!(matches!(err, KennelError::Remote(_)));
        assert_eq!(*api.calls.lock().unwrap(), vec!["delete monitor m1"]);
    }
}
