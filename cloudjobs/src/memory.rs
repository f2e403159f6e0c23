//! In-process provider simulation.
//!
//! These backends keep provider state in memory so the workflows and the
//! binaries can run without a network transport. Listings are paginated with
//! a configurable page size so callers see the same token flow as against a
//! real provider.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::job::{Execution, ExecutionName, JobName, OperationHandle, OperationStatus, Page, Scope};
use crate::service::{
    BatchJobService, BatchJobSpec, BatchJobStatus, ContainerConfig, ContainerRegistry, ObjectStore,
    RemoteJobService, ServiceResult,
};

const DEFAULT_PAGE_SIZE: usize = 50;

/// Serialized seed state for [`InMemoryJobService`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobFixture {
    #[serde(default)]
    pub jobs: Vec<FixtureJob>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixtureJob {
    /// Job id within the scope; the full name is derived from the scope.
    pub id: String,
    #[serde(default)]
    pub executions: Vec<FixtureExecution>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixtureExecution {
    pub id: String,
    #[serde(default)]
    pub reconciling: bool,
    #[serde(default)]
    pub running_count: u32,
}

impl JobFixture {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}

#[derive(Debug, Default)]
struct JobState {
    /// Job names per scope parent, in creation order.
    jobs: BTreeMap<String, Vec<JobName>>,
    executions: HashMap<JobName, Vec<Execution>>,
    operations: HashMap<OperationHandle, JobName>,
}

/// Simulated managed execution service.
///
/// A submitted execution starts with one running task and its start
/// operation completes on the first poll. Cancelling sets the running count
/// to zero.
#[derive(Debug)]
pub struct InMemoryJobService {
    state: Mutex<JobState>,
    page_size: usize,
}

impl InMemoryJobService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(JobState::default()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Seed jobs and executions for `scope` from a fixture.
    pub async fn seed(&self, scope: &Scope, fixture: &JobFixture) {
        for job in &fixture.jobs {
            let name = self.add_job(scope, &job.id).await;
            for execution in &job.executions {
                let execution = Execution::new(
                    format!("{}/executions/{}", name, execution.id),
                    name.clone(),
                )
                .with_reconciling(execution.reconciling)
                .with_running_count(execution.running_count);
                self.add_execution(execution).await;
            }
        }
    }

    pub async fn add_job(&self, scope: &Scope, job_id: &str) -> JobName {
        let name = scope.job_name(job_id);
        let mut state = self.state.lock().await;
        state
            .jobs
            .entry(scope.parent())
            .or_default()
            .push(name.clone());
        state.executions.entry(name.clone()).or_default();
        name
    }

    pub async fn add_execution(&self, execution: Execution) {
        let mut state = self.state.lock().await;
        state
            .executions
            .entry(execution.parent_job.clone())
            .or_default()
            .push(execution);
    }

    pub async fn executions(&self, job: &JobName) -> Vec<Execution> {
        let state = self.state.lock().await;
        state.executions.get(job).cloned().unwrap_or_default()
    }
}

impl Default for InMemoryJobService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteJobService for InMemoryJobService {
    async fn list_jobs_page(
        &self,
        scope: &Scope,
        page_token: Option<String>,
    ) -> ServiceResult<Page<JobName>> {
        let state = self.state.lock().await;
        let jobs = state.jobs.get(&scope.parent()).cloned().unwrap_or_default();
        paginate(jobs, page_token, self.page_size)
    }

    async fn list_executions_page(
        &self,
        job: &JobName,
        page_token: Option<String>,
    ) -> ServiceResult<Page<Execution>> {
        let state = self.state.lock().await;
        let executions = state
            .executions
            .get(job)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(job.as_str()))?;
        paginate(executions, page_token, self.page_size)
    }

    async fn submit(&self, job: &JobName) -> ServiceResult<OperationHandle> {
        let mut state = self.state.lock().await;
        let id = Uuid::new_v4();
        let executions = state
            .executions
            .get_mut(job)
            .ok_or_else(|| ServiceError::not_found(job.as_str()))?;
        executions.push(
            Execution::new(format!("{job}/executions/{id}"), job.clone())
                .with_running_count(1)
                .with_create_time(Utc::now()),
        );

        let handle = OperationHandle::new(format!("operations/{id}"));
        state.operations.insert(handle.clone(), job.clone());
        Ok(handle)
    }

    async fn poll_operation(&self, handle: &OperationHandle) -> ServiceResult<OperationStatus> {
        let state = self.state.lock().await;
        if state.operations.contains_key(handle) {
            Ok(OperationStatus::Done)
        } else {
            Err(ServiceError::not_found(handle.as_str()))
        }
    }

    async fn cancel(&self, execution: &ExecutionName) -> ServiceResult<()> {
        let mut state = self.state.lock().await;
        let found = state
            .executions
            .values_mut()
            .flat_map(|executions| executions.iter_mut())
            .find(|candidate| &candidate.name == execution)
            .ok_or_else(|| ServiceError::not_found(execution.as_str()))?;
        found.running_count = 0;
        found.reconciling = false;
        Ok(())
    }

    async fn delete_job(&self, job: &JobName) -> ServiceResult<()> {
        let mut state = self.state.lock().await;
        if state.executions.remove(job).is_none() {
            return Err(ServiceError::not_found(job.as_str()));
        }
        for jobs in state.jobs.values_mut() {
            jobs.retain(|candidate| candidate != job);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct BatchState {
    jobs: BTreeMap<String, Vec<JobName>>,
    statuses: HashMap<JobName, BatchJobStatus>,
}

/// Simulated batch service. Created jobs report `Queued` until
/// [`InMemoryBatchService::set_status`] moves them on.
#[derive(Debug)]
pub struct InMemoryBatchService {
    state: Mutex<BatchState>,
    page_size: usize,
}

impl InMemoryBatchService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BatchState::default()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub async fn set_status(&self, job: &JobName, status: BatchJobStatus) {
        self.state.lock().await.statuses.insert(job.clone(), status);
    }
}

impl Default for InMemoryBatchService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BatchJobService for InMemoryBatchService {
    async fn create_job(&self, scope: &Scope, spec: &BatchJobSpec) -> ServiceResult<JobName> {
        let name = scope.job_name(&spec.job_id);
        let mut state = self.state.lock().await;
        if state.statuses.contains_key(&name) {
            return Err(ServiceError::OperationFailed {
                operation: "create_job".to_string(),
                reason: format!("{name} already exists"),
            });
        }
        state
            .jobs
            .entry(scope.parent())
            .or_default()
            .push(name.clone());
        state.statuses.insert(name.clone(), BatchJobStatus::Queued);
        Ok(name)
    }

    async fn get_job(&self, job: &JobName) -> ServiceResult<BatchJobStatus> {
        let state = self.state.lock().await;
        state
            .statuses
            .get(job)
            .copied()
            .ok_or_else(|| ServiceError::not_found(job.as_str()))
    }

    async fn list_jobs_page(
        &self,
        scope: &Scope,
        page_token: Option<String>,
    ) -> ServiceResult<Page<JobName>> {
        let state = self.state.lock().await;
        let jobs = state.jobs.get(&scope.parent()).cloned().unwrap_or_default();
        paginate(jobs, page_token, self.page_size)
    }

    async fn delete_job(&self, job: &JobName) -> ServiceResult<()> {
        let mut state = self.state.lock().await;
        if state.statuses.remove(job).is_none() {
            return Err(ServiceError::not_found(job.as_str()));
        }
        for jobs in state.jobs.values_mut() {
            jobs.retain(|candidate| candidate != job);
        }
        Ok(())
    }
}

/// Simulated object storage with its container registry.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    containers: Mutex<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, container: &str, path: &str, content: Vec<u8>) -> ServiceResult<()> {
        let mut containers = self.containers.lock().await;
        let objects = containers
            .get_mut(container)
            .ok_or_else(|| ServiceError::not_found(container))?;
        objects.insert(path.to_string(), content);
        Ok(())
    }

    async fn get(&self, container: &str, path: &str) -> ServiceResult<Option<Vec<u8>>> {
        let containers = self.containers.lock().await;
        let objects = containers
            .get(container)
            .ok_or_else(|| ServiceError::not_found(container))?;
        Ok(objects.get(path).cloned())
    }

    async fn list(
        &self,
        container: &str,
        prefix: Option<&str>,
        delimiter: Option<&str>,
    ) -> ServiceResult<Vec<String>> {
        let containers = self.containers.lock().await;
        let objects = containers
            .get(container)
            .ok_or_else(|| ServiceError::not_found(container))?;
        let prefix = prefix.unwrap_or("");

        let mut listed = BTreeSet::new();
        for path in objects.keys().filter(|path| path.starts_with(prefix)) {
            let rest = &path[prefix.len()..];
            match delimiter.and_then(|d| rest.find(d).map(|at| at + d.len())) {
                Some(end) => listed.insert(format!("{prefix}{}", &rest[..end])),
                None => listed.insert(path.clone()),
            };
        }
        Ok(listed.into_iter().collect())
    }

    async fn delete(&self, container: &str, path: &str) -> ServiceResult<()> {
        let mut containers = self.containers.lock().await;
        if let Some(objects) = containers.get_mut(container) {
            objects.remove(path);
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerRegistry for InMemoryObjectStore {
    async fn create(&self, name: &str, _config: &ContainerConfig) -> ServiceResult<()> {
        let mut containers = self.containers.lock().await;
        if containers.contains_key(name) {
            return Err(ServiceError::OperationFailed {
                operation: "create_container".to_string(),
                reason: format!("{name} already exists"),
            });
        }
        containers.insert(name.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn list(&self) -> ServiceResult<Vec<String>> {
        Ok(self.containers.lock().await.keys().cloned().collect())
    }

    async fn delete(&self, name: &str) -> ServiceResult<()> {
        self.containers.lock().await.remove(name);
        Ok(())
    }
}

/// Slice `items` into a page starting at the offset encoded in `page_token`.
fn paginate<T>(
    items: Vec<T>,
    page_token: Option<String>,
    page_size: usize,
) -> ServiceResult<Page<T>> {
    let offset = match page_token {
        None => 0,
        Some(token) => token.parse::<usize>().map_err(|_| {
            ServiceError::Transport {
                message: format!("invalid page token {token:?}"),
            }
        })?,
    };

    let total = items.len();
    let end = offset.saturating_add(page_size).min(total);
    let page: Vec<T> = items.into_iter().skip(offset).take(page_size).collect();
    let next_page_token = (end < total).then(|| end.to_string());

    Ok(Page {
        items: page,
        next_page_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Scope {
        Scope::new("acme", "us-central1")
    }

    #[tokio::test]
    async fn paginates_jobs_with_offset_tokens() {
        let service = InMemoryJobService::new().with_page_size(2);
        for id in ["a", "b", "c"] {
            service.add_job(&scope(), id).await;
        }

        let first = service.list_jobs_page(&scope(), None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next_page_token.as_deref(), Some("2"));

        let second = service
            .list_jobs_page(&scope(), first.next_page_token)
            .await
            .unwrap();
        assert_eq!(second.items, vec![scope().job_name("c")]);
        assert!(second.next_page_token.is_none());
    }

    #[tokio::test]
    async fn seeded_fixture_is_listed() {
        let fixture = JobFixture::from_json(
            r#"{"jobs": [{"id": "job-A", "executions": [{"id": "exec-1", "running_count": 2}]}, {"id": "job-B"}]}"#,
        )
        .unwrap();
        let service = InMemoryJobService::new();
        service.seed(&scope(), &fixture).await;

        let jobs = service.list_jobs_page(&scope(), None).await.unwrap().items;
        assert_eq!(jobs.len(), 2);
        let executions = service.executions(&jobs[0]).await;
        assert_eq!(executions.len(), 1);
        assert!(executions[0].is_active());
    }

    #[tokio::test]
    async fn submit_then_cancel_settles_execution() {
        let service = InMemoryJobService::new();
        let job = service.add_job(&scope(), "nightly").await;

        let handle = service.submit(&job).await.unwrap();
        assert_eq!(
            service.poll_operation(&handle).await.unwrap(),
            OperationStatus::Done
        );

        let execution = service.executions(&job).await.remove(0);
        assert!(execution.is_active());
        service.cancel(&execution.name).await.unwrap();
        assert!(!service.executions(&job).await[0].is_active());

        let missing = service.cancel(&ExecutionName::from("nope")).await;
        assert!(missing.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn each_submission_gets_its_own_operation() {
        let service = InMemoryJobService::new();
        let job = service.add_job(&scope(), "nightly").await;

        let first = service.submit(&job).await.unwrap();
        let second = service.submit(&job).await.unwrap();
        assert_ne!(first, second);

        let executions = service.executions(&job).await;
        assert_eq!(executions.len(), 2);
        assert_ne!(executions[0].name, executions[1].name);
    }

    #[tokio::test]
    async fn object_listing_collapses_on_delimiter() {
        let store = InMemoryObjectStore::new();
        store.create("bucket", &ContainerConfig::default()).await.unwrap();
        store.put("bucket", "a/1.txt", b"1".to_vec()).await.unwrap();
        store.put("bucket", "a/sub/2.txt", b"2".to_vec()).await.unwrap();
        store.put("bucket", "b.txt", b"3".to_vec()).await.unwrap();

        let flat = ObjectStore::list(&store, "bucket", Some("a/"), None).await.unwrap();
        assert_eq!(flat, vec!["a/1.txt", "a/sub/2.txt"]);

        let grouped = ObjectStore::list(&store, "bucket", Some("a/"), Some("/"))
            .await
            .unwrap();
        assert_eq!(grouped, vec!["a/1.txt", "a/sub/"]);
    }

    #[tokio::test]
    async fn deletes_tolerate_absent_resources() {
        let store = InMemoryObjectStore::new();
        store.create("bucket", &ContainerConfig::default()).await.unwrap();
        ObjectStore::delete(&store, "bucket", "missing").await.unwrap();
        ContainerRegistry::delete(&store, "bucket").await.unwrap();
        ContainerRegistry::delete(&store, "bucket").await.unwrap();
    }

    #[test]
    fn huge_page_token_yields_an_empty_last_page() {
        let page = paginate(vec![1, 2, 3], Some(usize::MAX.to_string()), 2).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn bad_page_token_is_rejected() {
        let err = paginate(vec![1, 2, 3], Some("x".into()), 2).unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}
