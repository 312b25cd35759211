//! Datadog API module: the remote capability seam and its HTTP client.
//!
//! The synchronization engine consumes the remote API purely through the
//! [`DatadogApi`] trait (`list`/`show`/`create`/`update`/`delete`), so tests
//! can substitute in-memory fakes and the core stays transport-agnostic.

mod client;
mod types;

pub use client::{ApiCredentials, DatadogClient};
pub use types::{RemoteComponent, ResourceType, id_from_value};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Remote API capability consumed by the engine.
#[async_trait]
pub trait DatadogApi: Send + Sync {
    /// Lists all resources of a type. Envelopes are already unwrapped.
    async fn list(&self, resource: ResourceType) -> Result<Vec<Value>>;

    /// Fetches the full detail of one resource.
    async fn show(&self, resource: ResourceType, id: &str) -> Result<Value>;

    /// Creates a resource, returning the stored payload (with assigned id).
    async fn create(&self, resource: ResourceType, payload: &Value) -> Result<Value>;

    /// Updates a resource by id, returning the stored payload.
    async fn update(&self, resource: ResourceType, id: &str, payload: &Value) -> Result<Value>;

    /// Deletes a resource by id.
    async fn delete(&self, resource: ResourceType, id: &str) -> Result<()>;
}
