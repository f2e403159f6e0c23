use std::sync::Arc;
use std::time::Duration;

use crate::config::OrchestratorConfig;
use crate::error::LaunchError;
use crate::job::{JobName, LaunchMode, OperationHandle, OperationStatus};
use crate::service::RemoteJobService;
use crate::telemetry;

/// What a successful launch observed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The provider accepted the start request; nothing more is known.
    Accepted { operation: OperationHandle },
    /// The start operation reported completion after `polls` polls.
    Completed { operation: OperationHandle, polls: u32 },
}

impl LaunchOutcome {
    pub fn operation(&self) -> &OperationHandle {
        match self {
            LaunchOutcome::Accepted { operation }
            | LaunchOutcome::Completed { operation, .. } => operation,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchOutcome::Accepted { .. } => "accepted",
            LaunchOutcome::Completed { .. } => "completed",
        }
    }
}

/// Starts new executions of a job.
pub struct Launcher<S: RemoteJobService + ?Sized> {
    service: Arc<S>,
    poll_interval: Duration,
    max_polls: Option<u32>,
}

impl<S: RemoteJobService + ?Sized> Clone for Launcher<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            poll_interval: self.poll_interval,
            max_polls: self.max_polls,
        }
    }
}

impl<S: RemoteJobService + ?Sized> Launcher<S> {
    pub fn new(service: Arc<S>, config: &OrchestratorConfig) -> Self {
        Self {
            service,
            poll_interval: config.operation_poll_interval(),
            max_polls: config.max_operation_polls,
        }
    }

    /// Submit `job` and, in [`LaunchMode::WaitUntilDone`], wait for the start
    /// operation to finish.
    ///
    /// In [`LaunchMode::FireAndForget`] a later failure of the execution is
    /// invisible here.
    pub async fn try_launch(
        &self,
        job: &JobName,
        mode: LaunchMode,
    ) -> Result<LaunchOutcome, LaunchError> {
        let operation = self.service.submit(job).await.map_err(|source| {
            LaunchError::Submit {
                job: job.clone(),
                source,
            }
        })?;
        tracing::debug!(%job, %operation, %mode, "start request accepted");

        match mode {
            LaunchMode::FireAndForget => Ok(LaunchOutcome::Accepted { operation }),
            LaunchMode::WaitUntilDone => {
                let polls = self.await_completion(job, &operation).await?;
                Ok(LaunchOutcome::Completed { operation, polls })
            }
        }
    }

    /// Launch `job`, reporting only whether it went through.
    ///
    /// Errors from submission or from waiting are logged and become `false`.
    pub async fn launch(&self, job: &JobName, mode: LaunchMode) -> bool {
        let result = telemetry::instrument_launch(
            job.as_str(),
            mode.as_str(),
            self.try_launch(job, mode),
        )
        .await;

        match result {
            Ok(outcome) => {
                telemetry::record_launch(job.as_str(), mode.as_str(), outcome.as_str());
                true
            }
            Err(err) => {
                tracing::error!(%job, %mode, error = %err, "launch failed");
                telemetry::record_launch(job.as_str(), mode.as_str(), "failed");
                false
            }
        }
    }

    /// Poll the operation until it leaves `Pending`, returning the number of
    /// polls issued. The first poll happens immediately.
    async fn await_completion(
        &self,
        job: &JobName,
        operation: &OperationHandle,
    ) -> Result<u32, LaunchError> {
        let mut polls = 0u32;

        loop {
            if self.max_polls.is_some_and(|max| polls >= max) {
                return Err(LaunchError::PollLimit {
                    job: job.clone(),
                    operation: operation.clone(),
                    polls,
                });
            }

            let status = self.service.poll_operation(operation).await.map_err(
                |source| LaunchError::Poll {
                    job: job.clone(),
                    operation: operation.clone(),
                    source,
                },
            )?;
            polls += 1;

            match status {
                OperationStatus::Done => return Ok(polls),
                OperationStatus::Failed { reason } => {
                    return Err(LaunchError::OperationFailed {
                        job: job.clone(),
                        operation: operation.clone(),
                        reason,
                    });
                }
                OperationStatus::Pending => {
                    tracing::trace!(%operation, polls, "operation still pending");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}
