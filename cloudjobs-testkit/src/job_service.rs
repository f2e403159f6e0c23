use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use cloudjobs::runtime::StopToken;
use cloudjobs::*;
use parking_lot::Mutex;

/// One call received by [`RecordingJobService`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    ListJobs { scope: String, page_token: Option<String> },
    ListExecutions { job: JobName, page_token: Option<String> },
    Submit { job: JobName },
    PollOperation { operation: OperationHandle },
    Cancel { execution: ExecutionName },
    DeleteJob { job: JobName },
}

impl Call {
    /// Submit, list-executions and cancel calls; the ones a lifecycle run
    /// issues per job.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Call::Submit { .. } | Call::ListExecutions { .. } | Call::Cancel { .. }
        )
    }
}

#[derive(Default)]
struct Script {
    jobs: HashMap<String, Vec<JobName>>,
    executions: HashMap<JobName, Vec<Execution>>,
    operations: HashMap<OperationHandle, OperationScript>,
    next_operation: u64,
    polls_until_done: u32,
    page_size: Option<usize>,
    list_jobs_failure: Option<(usize, ServiceError)>,
    list_executions_failures: HashMap<JobName, ServiceError>,
    submit_failures: HashMap<JobName, ServiceError>,
    operation_failures: HashMap<JobName, String>,
    cancel_failures: HashMap<ExecutionName, ServiceError>,
    failing_executions: HashSet<JobName>,
    stop_trigger: Option<StopTrigger>,
}

struct StopTrigger {
    token: StopToken,
    matches: fn(&Call) -> bool,
    remaining: usize,
}

struct OperationScript {
    job: JobName,
    polls: u32,
}

/// Scripted [`RemoteJobService`] that records every call in order.
///
/// By default submitting does not create an execution, start operations
/// complete on the first poll, and cancelling an unknown execution reports
/// not-found.
#[derive(Clone)]
pub struct RecordingJobService {
    calls: Arc<Mutex<Vec<Call>>>,
    script: Arc<Mutex<Script>>,
}

impl RecordingJobService {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(Mutex::new(Script {
                polls_until_done: 1,
                ..Script::default()
            })),
        }
    }

    pub fn with_job(self, scope: &Scope, job_id: &str) -> Self {
        let name = JobName::from(job_id);
        let mut script = self.script.lock();
        script.jobs.entry(scope.parent()).or_default().push(name.clone());
        script.executions.entry(name).or_default();
        drop(script);
        self
    }

    pub fn with_execution(self, execution: Execution) -> Self {
        self.script
            .lock()
            .executions
            .entry(execution.parent_job.clone())
            .or_default()
            .push(execution);
        self
    }

    /// Start operations report `Done` on the `polls`-th poll.
    pub fn with_polls_until_done(self, polls: u32) -> Self {
        self.script.lock().polls_until_done = polls.max(1);
        self
    }

    pub fn with_page_size(self, page_size: usize) -> Self {
        self.script.lock().page_size = Some(page_size.max(1));
        self
    }

    /// Fail the job listing when page `page` (0-based) is requested.
    pub fn fail_list_jobs_on_page(self, page: usize, error: ServiceError) -> Self {
        self.script.lock().list_jobs_failure = Some((page, error));
        self
    }

    pub fn fail_list_executions(self, job: &str, error: ServiceError) -> Self {
        self.script
            .lock()
            .list_executions_failures
            .insert(JobName::from(job), error);
        self
    }

    pub fn fail_submit(self, job: &str, error: ServiceError) -> Self {
        self.script
            .lock()
            .submit_failures
            .insert(JobName::from(job), error);
        self
    }

    /// Start operations of `job` finish as failed once they complete.
    pub fn fail_operation(self, job: &str, reason: &str) -> Self {
        self.script
            .lock()
            .operation_failures
            .insert(JobName::from(job), reason.to_string());
        self
    }

    /// Accept submissions of `job`, then record the new execution as failed
    /// and finish its start operation with a failure.
    pub fn with_failing_executions(self, job: &str) -> Self {
        let job = JobName::from(job);
        let mut script = self.script.lock();
        script.failing_executions.insert(job.clone());
        script
            .operation_failures
            .insert(job, "execution failed".to_string());
        drop(script);
        self
    }

    pub fn fail_cancel(self, execution: &str, error: ServiceError) -> Self {
        self.script
            .lock()
            .cancel_failures
            .insert(ExecutionName::from(execution), error);
        self
    }

    /// Stop `token` while the `count`-th call matching `matches` is in
    /// flight, as if an interrupt arrived during that request.
    pub fn stop_during(self, token: StopToken, matches: fn(&Call) -> bool, count: usize) -> Self {
        self.script.lock().stop_trigger = Some(StopTrigger {
            token,
            matches,
            remaining: count.max(1),
        });
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn lifecycle_calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.is_lifecycle())
            .cloned()
            .collect()
    }

    pub fn poll_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, Call::PollOperation { .. }))
            .count()
    }

    pub fn assert_call_count_eq(&self, expected: usize) {
        let actual = self.calls.lock().len();
        assert_eq!(actual, expected, "Expected {expected} calls, got {actual}");
    }

    pub fn executions(&self, job: &str) -> Vec<Execution> {
        self.script
            .lock()
            .executions
            .get(&JobName::from(job))
            .cloned()
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: Call) {
        if let Some(trigger) = self.script.lock().stop_trigger.as_mut() {
            if trigger.remaining > 0 && (trigger.matches)(&call) {
                trigger.remaining -= 1;
                if trigger.remaining == 0 {
                    trigger.token.stop();
                }
            }
        }
        self.calls.lock().push(call);
    }
}

impl Default for RecordingJobService {
    fn default() -> Self {
        Self::new()
    }
}

fn page_of<T: Clone>(items: &[T], page_token: Option<&str>, page_size: Option<usize>) -> Page<T> {
    let offset = page_token
        .and_then(|token| token.parse::<usize>().ok())
        .unwrap_or(0);
    let size = page_size.unwrap_or(items.len().max(1));
    let end = (offset + size).min(items.len());
    let slice = items.get(offset..end).unwrap_or_default().to_vec();
    if end < items.len() {
        Page::with_next(slice, end.to_string())
    } else {
        Page::last(slice)
    }
}

#[async_trait]
impl RemoteJobService for RecordingJobService {
    async fn list_jobs_page(
        &self,
        scope: &Scope,
        page_token: Option<String>,
    ) -> Result<Page<JobName>, ServiceError> {
        self.record(Call::ListJobs {
            scope: scope.parent(),
            page_token: page_token.clone(),
        });

        let script = self.script.lock();
        let jobs = script.jobs.get(&scope.parent()).cloned().unwrap_or_default();
        let page = page_of(&jobs, page_token.as_deref(), script.page_size);

        if let Some((fail_page, error)) = &script.list_jobs_failure {
            let size = script.page_size.unwrap_or(jobs.len().max(1));
            let current = page_token
                .as_deref()
                .and_then(|token| token.parse::<usize>().ok())
                .map_or(0, |offset| offset / size);
            if current == *fail_page {
                return Err(error.clone());
            }
        }
        Ok(page)
    }

    async fn list_executions_page(
        &self,
        job: &JobName,
        page_token: Option<String>,
    ) -> Result<Page<Execution>, ServiceError> {
        self.record(Call::ListExecutions {
            job: job.clone(),
            page_token: page_token.clone(),
        });

        let script = self.script.lock();
        if let Some(error) = script.list_executions_failures.get(job) {
            return Err(error.clone());
        }
        let executions = script
            .executions
            .get(job)
            .ok_or_else(|| ServiceError::not_found(job.as_str()))?;
        Ok(page_of(executions, page_token.as_deref(), script.page_size))
    }

    async fn submit(&self, job: &JobName) -> Result<OperationHandle, ServiceError> {
        self.record(Call::Submit { job: job.clone() });

        let mut script = self.script.lock();
        if let Some(error) = script.submit_failures.get(job) {
            return Err(error.clone());
        }

        script.next_operation += 1;
        let handle = OperationHandle::new(format!("operations/{}", script.next_operation));
        if script.failing_executions.contains(job) {
            let name = format!("{job}-run-{}", script.next_operation);
            script
                .executions
                .entry(job.clone())
                .or_default()
                .push(Execution::new(name, job.clone()));
        }
        script.operations.insert(
            handle.clone(),
            OperationScript {
                job: job.clone(),
                polls: 0,
            },
        );
        Ok(handle)
    }

    async fn poll_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, ServiceError> {
        self.record(Call::PollOperation {
            operation: handle.clone(),
        });

        let mut script = self.script.lock();
        let until = script.polls_until_done;
        let operation = script
            .operations
            .get_mut(handle)
            .ok_or_else(|| ServiceError::not_found(handle.as_str()))?;
        operation.polls += 1;
        if operation.polls < until {
            return Ok(OperationStatus::Pending);
        }

        let job = operation.job.clone();
        Ok(match script.operation_failures.get(&job) {
            Some(reason) => OperationStatus::Failed {
                reason: reason.clone(),
            },
            None => OperationStatus::Done,
        })
    }

    async fn cancel(&self, execution: &ExecutionName) -> Result<(), ServiceError> {
        self.record(Call::Cancel {
            execution: execution.clone(),
        });

        let mut script = self.script.lock();
        if let Some(error) = script.cancel_failures.get(execution) {
            return Err(error.clone());
        }
        let found = script
            .executions
            .values_mut()
            .flat_map(|executions| executions.iter_mut())
            .find(|candidate| &candidate.name == execution)
            .ok_or_else(|| ServiceError::not_found(execution.as_str()))?;
        found.running_count = 0;
        found.reconciling = false;
        Ok(())
    }

    async fn delete_job(&self, job: &JobName) -> Result<(), ServiceError> {
        self.record(Call::DeleteJob { job: job.clone() });

        let mut script = self.script.lock();
        if script.executions.remove(job).is_none() {
            return Err(ServiceError::not_found(job.as_str()));
        }
        for jobs in script.jobs.values_mut() {
            jobs.retain(|candidate| candidate != job);
        }
        Ok(())
    }
}
