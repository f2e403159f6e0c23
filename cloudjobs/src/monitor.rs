use std::sync::Arc;
use std::time::Duration;

use crate::catalog::JobCatalog;
use crate::error::CatalogError;
use crate::job::{ExecutionName, JobName};
use crate::service::RemoteJobService;

/// Bound for [`ExecutionMonitor::wait_until_idle`].
#[derive(Clone, Copy, Debug)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdleOutcome {
    Idle { attempts: u32 },
    StillActive {
        attempts: u32,
        remaining: Vec<ExecutionName>,
    },
}

/// Snapshot queries for executions that are still active.
pub struct ExecutionMonitor<S: RemoteJobService + ?Sized> {
    catalog: JobCatalog<S>,
}

impl<S: RemoteJobService + ?Sized> Clone for ExecutionMonitor<S> {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
        }
    }
}

impl<S: RemoteJobService + ?Sized> ExecutionMonitor<S> {
    pub fn new(catalog: JobCatalog<S>) -> Self {
        Self { catalog }
    }

    pub fn from_service(service: Arc<S>) -> Self {
        Self::new(JobCatalog::new(service))
    }

    /// Names of the active executions of `job`, from a single snapshot.
    ///
    /// Empty both when nothing is active and when the listing failed.
    pub async fn active_execution_names(&self, job: &JobName) -> Vec<ExecutionName> {
        self.catalog
            .list_active_executions(job)
            .await
            .into_iter()
            .map(|execution| execution.name)
            .collect()
    }

    pub async fn try_active_execution_names(
        &self,
        job: &JobName,
    ) -> Result<Vec<ExecutionName>, CatalogError> {
        Ok(self
            .catalog
            .try_list_active_executions(job)
            .await?
            .into_iter()
            .map(|execution| execution.name)
            .collect())
    }

    /// Re-take snapshots until `job` has no active executions or the policy
    /// runs out of attempts.
    ///
    /// A failed listing ends the wait with the error rather than being read
    /// as "idle".
    ///
    /// At least one snapshot is always taken, even with `max_attempts == 0`.
    pub async fn wait_until_idle(
        &self,
        job: &JobName,
        policy: WaitPolicy,
    ) -> Result<IdleOutcome, CatalogError> {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempts = 0u32;
        let mut remaining = Vec::new();

        while attempts < max_attempts {
            if attempts > 0 {
                tokio::time::sleep(policy.interval).await;
            }
            remaining = self.try_active_execution_names(job).await?;
            attempts += 1;

            if remaining.is_empty() {
                return Ok(IdleOutcome::Idle { attempts });
            }
            tracing::debug!(%job, attempts, active = remaining.len(), "executions still active");
        }

        Ok(IdleOutcome::StillActive {
            attempts,
            remaining,
        })
    }
}
