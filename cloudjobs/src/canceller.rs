use std::sync::Arc;

use tracing::Instrument;

use crate::error::CancelError;
use crate::job::{CancellationResult, ExecutionName, JobName};
use crate::service::RemoteJobService;
use crate::telemetry;

/// Requests cancellation of individual executions.
///
/// Cancellation is asynchronous on the provider side: an accepted request
/// says nothing about whether the execution has stopped yet.
pub struct Canceller<S: RemoteJobService + ?Sized> {
    service: Arc<S>,
}

impl<S: RemoteJobService + ?Sized> Clone for Canceller<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S: RemoteJobService + ?Sized> Canceller<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    /// Not-found is reported as [`CancellationResult::AlreadyGone`], mirroring
    /// how deletes tolerate absent resources.
    pub async fn try_cancel(
        &self,
        execution: &ExecutionName,
    ) -> Result<CancellationResult, CancelError> {
        match self.service.cancel(execution).await {
            Ok(()) => Ok(CancellationResult::Requested),
            Err(err) if err.is_not_found() => Ok(CancellationResult::AlreadyGone),
            Err(source) => Err(CancelError {
                execution: execution.clone(),
                source,
            }),
        }
    }

    /// Like [`Canceller::try_cancel`] but never fails: errors are logged and
    /// folded into [`CancellationResult::Failed`].
    pub async fn cancel_with_result(&self, execution: &ExecutionName) -> CancellationResult {
        let result = self
            .try_cancel(execution)
            .instrument(telemetry::cancel_span(execution.as_str()))
            .await
            .unwrap_or_else(|err| {
                tracing::error!(%execution, error = %err, "cancel failed");
                CancellationResult::Failed {
                    reason: err.source.to_string(),
                }
            });
        telemetry::record_cancellation(execution.as_str(), result.as_str());
        result
    }

    pub async fn cancel(&self, execution: &ExecutionName) -> bool {
        self.cancel_with_result(execution).await.is_success()
    }

    /// Delete a job definition; an already-absent job counts as deleted, so
    /// repeating the call keeps returning `true`.
    pub async fn delete_job(&self, job: &JobName) -> bool {
        match self.service.delete_job(job).await {
            Ok(()) => true,
            Err(err) if err.is_not_found() => {
                tracing::debug!(%job, "job already absent");
                true
            }
            Err(err) => {
                tracing::error!(%job, error = %err, "deleting job failed");
                false
            }
        }
    }
}
