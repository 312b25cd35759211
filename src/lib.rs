// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![forbid(unsafe_code)]               // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::redundant_clone)]     // Useless clones warning

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Kennel
//!
//! Datadog monitors, dashboards and SLOs as code.
//!
//! ## Overview
//!
//! Kennel keeps a Datadog account in sync with declarations checked into a
//! repository:
//!
//! - Declare monitors, dashboards and SLOs in YAML project files
//! - Preview every change as an ordered plan before it is applied
//! - Track ownership through markers embedded in the resources themselves,
//!   with no state file to persist between runs
//! - Delete tracked resources automatically when their declaration is removed
//!
//! ## Architecture
//!
//! A run flows through four stages:
//!
//! 1. **Declarations**: Parsed from project files into canonical payloads
//! 2. **Remote state**: Downloaded from the Datadog API
//! 3. **Matching and planning**: Declarations are resolved to remote objects
//!    by tracking marker, and the differences become an ordered plan
//! 4. **Execution**: After confirmation, the plan is applied sequentially
//!
//! ## Modules
//!
//! - [`config`]: Project file parsing
//! - [`models`]: Declared resources and their canonical payloads
//! - [`tracking`]: Tracking-marker identity
//! - [`datadog`]: Datadog API client
//! - [`syncer`]: Matching, diffing, planning and execution
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! project:
//!   name: gateway
//!   tags:
//!     - team:core
//!
//! monitors:
//!   - kennel_id: cpu-high
//!     name: "Gateway CPU high"
//!     type: query alert
//!     query: "avg(last_5m):avg:system.cpu{service:gateway} > 90"
//!     critical: 90
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod datadog;
pub mod error;
pub mod models;
pub mod syncer;
pub mod tracking;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, load_declarations};
pub use datadog::{ApiCredentials, DatadogApi, DatadogClient, RemoteComponent, ResourceType};
pub use error::{KennelError, Result};
pub use models::{Project, Resource};
pub use syncer::{Confirmation, ConfirmationGate, Executor, Plan, Syncer};
pub use tracking::TrackingId;
