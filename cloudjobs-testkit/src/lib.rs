//! Test doubles for the cloudjobs collaborator interfaces.

mod batch;
mod job_service;
mod storage;

pub use batch::{BatchCall, RecordingBatchService};
pub use job_service::{Call, RecordingJobService};
pub use storage::{FlakyObjectStore, StorageOp};

use cloudjobs::Scope;

/// Scope used throughout the test suites.
pub fn test_scope() -> Scope {
    Scope::new("test-project", "test-region")
}
