use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Project/region pair identifying where catalog operations apply.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub project: String,
    pub region: String,
}

impl Scope {
    pub fn new(project: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            region: region.into(),
        }
    }

    /// Resource path used as the parent of every job in this scope.
    pub fn parent(&self) -> String {
        format!("projects/{}/locations/{}", self.project, self.region)
    }

    /// Fully-qualified name for a job id living in this scope.
    pub fn job_name(&self, job_id: &str) -> JobName {
        JobName::new(format!("{}/jobs/{}", self.parent(), job_id))
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.parent())
    }
}

/// Opaque resource identifier of a submittable job definition.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobName(String);

impl JobName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing segment of the resource path (`.../jobs/<id>` -> `<id>`).
    pub fn short_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl Display for JobName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionName(String);

impl ExecutionName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ExecutionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ExecutionName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ExecutionName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single run instance of a job, as last reported by the provider.
///
/// The provider exposes no explicit status enum for executions; activity is
/// derived from `reconciling` and `running_count` only.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub name: ExecutionName,
    /// Lookup-only back reference to the job this execution was started from.
    pub parent_job: JobName,
    pub reconciling: bool,
    pub running_count: u32,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
}

impl Execution {
    pub fn new(name: impl Into<ExecutionName>, parent_job: impl Into<JobName>) -> Self {
        Self {
            name: name.into(),
            parent_job: parent_job.into(),
            reconciling: false,
            running_count: 0,
            create_time: None,
        }
    }

    pub fn with_reconciling(mut self, reconciling: bool) -> Self {
        self.reconciling = reconciling;
        self
    }

    pub fn with_running_count(mut self, running_count: u32) -> Self {
        self.running_count = running_count;
        self
    }

    pub fn with_create_time(mut self, create_time: DateTime<Utc>) -> Self {
        self.create_time = Some(create_time);
        self
    }

    /// An execution is active while the provider is still converging its
    /// resources or while any of its tasks are running.
    pub fn is_active(&self) -> bool {
        self.reconciling || self.running_count > 0
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchMode {
    /// Return as soon as the provider accepts the start request.
    FireAndForget,
    /// Block until the start operation reports completion.
    WaitUntilDone,
}

impl LaunchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchMode::FireAndForget => "fire_and_forget",
            LaunchMode::WaitUntilDone => "wait_until_done",
        }
    }
}

impl Display for LaunchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one cancellation request.
///
/// `Requested` only means the provider accepted the request; the execution
/// may still be running when the call returns.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum CancellationResult {
    Requested,
    /// The provider no longer knows the execution. Counted as success.
    AlreadyGone,
    Failed { reason: String },
}

impl CancellationResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, CancellationResult::Failed { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CancellationResult::Requested => "requested",
            CancellationResult::AlreadyGone => "already_gone",
            CancellationResult::Failed { .. } => "failed",
        }
    }
}

/// Handle of a provider-side long-running operation.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationHandle(String);

impl OperationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OperationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum OperationStatus {
    Pending,
    Done,
    Failed { reason: String },
}

/// One page of a provider listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }

    pub fn with_next(items: Vec<T>, token: impl Into<String>) -> Self {
        Self {
            items,
            next_page_token: Some(token.into()),
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::last(Vec::new())
    }
}
