//! Cloudjobs - lifecycle orchestration for remotely executed compute jobs.
//!
//! Jobs run on a managed execution service that offers no push notification.
//! Their state is only observed by listing, and it is eventually consistent.
//! This crate sequences the calls that submit jobs, discover what is still
//! running and cancel it, with every piece of state re-read from the
//! provider on each call.
//!
//! # Core Concepts
//!
//! - **Catalog**: [`JobCatalog`] drains paginated listings of job definitions
//!   and active executions.
//!
//! - **Launcher**: [`Launcher`] submits a job either fire-and-forget or
//!   waiting for the start operation to complete.
//!
//! - **Monitor**: [`ExecutionMonitor`] takes snapshots of active executions,
//!   where active means `reconciling || running_count > 0`.
//!
//! - **Canceller**: [`Canceller`] requests cancellation of one execution.
//!
//! - **Runtime**: [`runtime::Orchestrator`] composes the above into a
//!   strictly sequential workflow; [`runtime::BatchWorkflow`] and
//!   [`runtime::StorageWorkflow`] cover the batch and storage variants.
//!
//! Each component has a `try_*` form returning a structured error and a
//! plain form that logs the error and returns `false` or an empty list.
//!
//! # Feature Flags
//!
//! - `metrics` - Prometheus counters for launches, cancellations and failed
//!   listings
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cloudjobs::*;
//! use cloudjobs::runtime::OrchestratorBuilder;
//!
//! let service = Arc::new(memory::InMemoryJobService::new());
//! let orchestrator = OrchestratorBuilder::new(OrchestratorConfig::default())
//!     .with_service(service)
//!     .build()?;
//! let report = orchestrator.run(&Scope::new("acme", "us-central1")).await;
//! ```

/// Execution cancellation.
pub mod canceller;

/// Paginated listings of jobs and active executions.
pub mod catalog;

/// Command-line argument contracts for the binaries.
pub mod cli;

/// Configuration for the lifecycle components and the batch workflow.
pub mod config;

/// Structured error types.
pub mod error;

/// Core data model: scopes, jobs, executions and operation handles.
pub mod job;

/// Execution launching in fire-and-forget or wait-until-done mode.
pub mod launcher;

/// In-memory provider simulation used by the binaries.
pub mod memory;

#[cfg(feature = "metrics")]
/// Prometheus metrics.
pub mod metrics;

/// Snapshot monitoring of active executions.
pub mod monitor;

/// Workflow drivers and their reports.
pub mod runtime;

/// Collaborator interfaces for the remote services.
pub mod service;

/// Tracing spans and outcome recording.
pub mod telemetry;

pub use canceller::*;
pub use catalog::*;
pub use config::*;
pub use error::*;
pub use job::*;
pub use launcher::*;
pub use monitor::*;
pub use service::*;
