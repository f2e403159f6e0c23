/// Batch workflow with a fixed inspection delay.
pub mod batch;
/// Builder for constructing orchestrators.
pub mod builder;
/// Sequential lifecycle driver and stop signalling.
pub mod driver;
/// Run reports for every workflow.
pub mod report;
/// Object storage demo workflow.
pub mod storage;

pub use batch::BatchWorkflow;
pub use builder::OrchestratorBuilder;
pub use driver::{Orchestrator, StopToken};
pub use report::{
    BatchReport, CancelRecord, LaunchRecord, MonitorRecord, RunReport, StorageReport, StorageStep,
};
pub use storage::StorageWorkflow;
