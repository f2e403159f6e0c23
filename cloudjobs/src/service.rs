use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

use crate::error::ServiceError;
use crate::job::{Execution, ExecutionName, JobName, OperationHandle, OperationStatus, Page, Scope};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Managed execution service running jobs on the caller's behalf.
///
/// Every call is a fresh read or a single request against the provider;
/// implementations must not cache state between calls.
#[async_trait]
pub trait RemoteJobService: Send + Sync {
    /// Fetch one page of job definitions in `scope`.
    async fn list_jobs_page(
        &self,
        scope: &Scope,
        page_token: Option<String>,
    ) -> ServiceResult<Page<JobName>>;

    /// Fetch one page of executions started from `job`.
    async fn list_executions_page(
        &self,
        job: &JobName,
        page_token: Option<String>,
    ) -> ServiceResult<Page<Execution>>;

    /// Request a new execution of `job`.
    async fn submit(&self, job: &JobName) -> ServiceResult<OperationHandle>;

    /// Read the current state of a long-running start operation.
    async fn poll_operation(&self, handle: &OperationHandle) -> ServiceResult<OperationStatus>;

    /// Request cancellation of an execution.
    async fn cancel(&self, execution: &ExecutionName) -> ServiceResult<()>;

    /// Delete a job definition.
    async fn delete_job(&self, job: &JobName) -> ServiceResult<()>;
}

/// Definition of a batch job to create.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchJobSpec {
    pub job_id: String,
    pub script: String,
    pub task_count: u32,
    pub parallelism: u32,
    #[serde(default)]
    pub machine_type: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl BatchJobSpec {
    pub fn new(job_id: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            script: script.into(),
            task_count: 1,
            parallelism: 1,
            machine_type: None,
            labels: BTreeMap::new(),
        }
    }

    pub fn with_tasks(mut self, task_count: u32, parallelism: u32) -> Self {
        self.task_count = task_count;
        self.parallelism = parallelism;
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Provider-reported state of a batch job.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchJobStatus {
    Unspecified,
    Queued,
    Scheduled,
    Running,
    Succeeded,
    Failed,
    DeletionInProgress,
}

impl BatchJobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchJobStatus::Succeeded | BatchJobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchJobStatus::Unspecified => "unspecified",
            BatchJobStatus::Queued => "queued",
            BatchJobStatus::Scheduled => "scheduled",
            BatchJobStatus::Running => "running",
            BatchJobStatus::Succeeded => "succeeded",
            BatchJobStatus::Failed => "failed",
            BatchJobStatus::DeletionInProgress => "deletion_in_progress",
        }
    }
}

impl Display for BatchJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Batch compute service where jobs are created and then run on their own.
#[async_trait]
pub trait BatchJobService: Send + Sync {
    async fn create_job(&self, scope: &Scope, spec: &BatchJobSpec) -> ServiceResult<JobName>;

    async fn get_job(&self, job: &JobName) -> ServiceResult<BatchJobStatus>;

    async fn list_jobs_page(
        &self,
        scope: &Scope,
        page_token: Option<String>,
    ) -> ServiceResult<Page<JobName>>;

    /// Delete a batch job. An absent job may be reported as not-found.
    async fn delete_job(&self, job: &JobName) -> ServiceResult<()>;
}

/// Flat object storage keyed by container and path.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, container: &str, path: &str, content: Vec<u8>) -> ServiceResult<()>;

    /// `Ok(None)` when the object does not exist.
    async fn get(&self, container: &str, path: &str) -> ServiceResult<Option<Vec<u8>>>;

    /// List paths under `prefix`. With a `delimiter`, paths sharing the next
    /// delimited segment collapse into a single common prefix entry.
    async fn list(
        &self,
        container: &str,
        prefix: Option<&str>,
        delimiter: Option<&str>,
    ) -> ServiceResult<Vec<String>>;

    /// Delete an object. Deleting an absent object succeeds.
    async fn delete(&self, container: &str, path: &str) -> ServiceResult<()>;
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContainerConfig {
    pub location: String,
    pub storage_class: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            location: "US".to_string(),
            storage_class: "STANDARD".to_string(),
        }
    }
}

/// Lifecycle of the containers (buckets) holding objects.
#[async_trait]
pub trait ContainerRegistry: Send + Sync {
    async fn create(&self, name: &str, config: &ContainerConfig) -> ServiceResult<()>;

    async fn list(&self) -> ServiceResult<Vec<String>>;

    /// Delete a container. Deleting an absent container succeeds.
    async fn delete(&self, name: &str) -> ServiceResult<()>;
}
