//! Declared-resource domain models.
//!
//! Projects own resources; each resource knows how to render its canonical
//! API payload and diff itself against remote state.

mod dashboard;
mod monitor;
mod project;
mod resource;
mod slo;

pub use dashboard::Dashboard;
pub use monitor::Monitor;
pub use project::Project;
pub use resource::{Resource, platform_url};
pub use slo::Slo;
