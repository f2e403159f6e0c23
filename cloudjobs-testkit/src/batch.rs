use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use cloudjobs::*;
use parking_lot::Mutex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchCall {
    CreateJob { scope: String, job_id: String },
    GetJob { job: JobName },
    ListJobs { scope: String },
    DeleteJob { job: JobName },
}

#[derive(Default)]
struct BatchScript {
    jobs: Vec<JobName>,
    statuses: VecDeque<BatchJobStatus>,
    last_status: Option<BatchJobStatus>,
    create_failure: Option<ServiceError>,
    list_failure: Option<ServiceError>,
}

/// Scripted [`BatchJobService`] that records every call with the tokio
/// instant it arrived at.
///
/// `get_job` hands out the scripted statuses in order and then keeps
/// repeating the last one.
#[derive(Clone, Default)]
pub struct RecordingBatchService {
    calls: Arc<Mutex<Vec<(tokio::time::Instant, BatchCall)>>>,
    script: Arc<Mutex<BatchScript>>,
}

impl RecordingBatchService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statuses(self, statuses: impl IntoIterator<Item = BatchJobStatus>) -> Self {
        self.script.lock().statuses.extend(statuses);
        self
    }

    pub fn fail_create(self, error: ServiceError) -> Self {
        self.script.lock().create_failure = Some(error);
        self
    }

    pub fn fail_list(self, error: ServiceError) -> Self {
        self.script.lock().list_failure = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<BatchCall> {
        self.calls.lock().iter().map(|(_, call)| call.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(tokio::time::Instant, BatchCall)> {
        self.calls.lock().clone()
    }

    fn record(&self, call: BatchCall) {
        self.calls.lock().push((tokio::time::Instant::now(), call));
    }
}

#[async_trait]
impl BatchJobService for RecordingBatchService {
    async fn create_job(
        &self,
        scope: &Scope,
        spec: &BatchJobSpec,
    ) -> Result<JobName, ServiceError> {
        self.record(BatchCall::CreateJob {
            scope: scope.parent(),
            job_id: spec.job_id.clone(),
        });

        let mut script = self.script.lock();
        if let Some(error) = &script.create_failure {
            return Err(error.clone());
        }
        let name = scope.job_name(&spec.job_id);
        script.jobs.push(name.clone());
        Ok(name)
    }

    async fn get_job(&self, job: &JobName) -> Result<BatchJobStatus, ServiceError> {
        self.record(BatchCall::GetJob { job: job.clone() });

        let mut script = self.script.lock();
        if !script.jobs.contains(job) {
            return Err(ServiceError::not_found(job.as_str()));
        }
        let status = match script.statuses.pop_front() {
            Some(status) => status,
            None => script.last_status.unwrap_or(BatchJobStatus::Queued),
        };
        script.last_status = Some(status);
        Ok(status)
    }

    async fn list_jobs_page(
        &self,
        scope: &Scope,
        _page_token: Option<String>,
    ) -> Result<Page<JobName>, ServiceError> {
        self.record(BatchCall::ListJobs {
            scope: scope.parent(),
        });

        let script = self.script.lock();
        if let Some(error) = &script.list_failure {
            return Err(error.clone());
        }
        Ok(Page::last(script.jobs.clone()))
    }

    async fn delete_job(&self, job: &JobName) -> Result<(), ServiceError> {
        self.record(BatchCall::DeleteJob { job: job.clone() });

        let mut script = self.script.lock();
        let before = script.jobs.len();
        script.jobs.retain(|candidate| candidate != job);
        if script.jobs.len() == before {
            return Err(ServiceError::not_found(job.as_str()));
        }
        Ok(())
    }
}
