use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::Instrument;

use crate::catalog::drain_pages;
use crate::config::{BatchConfig, PollingStrategy};
use crate::job::{JobName, Scope};
use crate::service::{BatchJobService, BatchJobSpec, BatchJobStatus};
use crate::telemetry;

use super::report::BatchReport;

/// Create a batch job, give it time to run, then inspect and clean it up.
///
/// With [`PollingStrategy::FixedDelay`] the workflow sleeps once for the
/// configured delay and reads the job state a single time; it does not
/// wait for a terminal state.
pub struct BatchWorkflow<B: BatchJobService + ?Sized> {
    service: Arc<B>,
    config: BatchConfig,
    max_list_pages: Option<u32>,
}

impl<B: BatchJobService + ?Sized> BatchWorkflow<B> {
    pub fn new(service: Arc<B>, config: BatchConfig) -> Self {
        Self {
            service,
            config,
            max_list_pages: None,
        }
    }

    pub fn with_max_list_pages(mut self, pages: Option<u32>) -> Self {
        self.max_list_pages = pages;
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub async fn run(&self, scope: &Scope, spec: &BatchJobSpec) -> BatchReport {
        let span = telemetry::run_span("batch", scope.parent());
        self.run_steps(scope, spec).instrument(span).await
    }

    async fn run_steps(&self, scope: &Scope, spec: &BatchJobSpec) -> BatchReport {
        let mut report = BatchReport::new(scope.parent());

        tracing::info!(%scope, job_id = %spec.job_id, "creating batch job");
        match self.service.create_job(scope, spec).await {
            Ok(job) => {
                tracing::info!(%job, "batch job created");
                report.job = Some(job);
            }
            Err(err) => {
                tracing::error!(
                    %scope,
                    job_id = %spec.job_id,
                    error = %err,
                    "batch job creation failed"
                );
            }
        }

        if let Some(job) = report.job.clone() {
            let started = Instant::now();
            match &self.config.strategy {
                PollingStrategy::FixedDelay => {
                    let delay = self.config.poll_delay();
                    tracing::info!(%job, delay_secs = delay.as_secs(), "waiting before inspection");
                    tokio::time::sleep(delay).await;
                    report.status = self.check_status(&job, &mut report.status_checks).await;
                }
                PollingStrategy::UntilTerminal {
                    interval_ms,
                    max_attempts,
                } => {
                    report.status = self
                        .poll_until_terminal(
                            &job,
                            Duration::from_millis(*interval_ms),
                            *max_attempts,
                            &mut report.status_checks,
                        )
                        .await;
                }
            }
            report.waited_ms = started.elapsed().as_millis();
        }

        tracing::info!(%scope, "listing batch jobs");
        report.listed_jobs = self.list_jobs(scope).await;
        for job in &report.listed_jobs {
            tracing::info!(%job, "batch job present");
        }

        if let Some(job) = report.job.clone() {
            if self.config.delete_after_inspection {
                tracing::info!(%job, "deleting batch job");
                report.deleted = self.delete_job(&job).await;
            }
        }

        report.finish();
        report
    }

    async fn check_status(&self, job: &JobName, checks: &mut u32) -> Option<BatchJobStatus> {
        *checks += 1;
        match self.service.get_job(job).await {
            Ok(status) => {
                tracing::info!(%job, %status, "batch job status");
                Some(status)
            }
            Err(err) => {
                tracing::error!(%job, error = %err, "reading batch job status failed");
                None
            }
        }
    }

    async fn poll_until_terminal(
        &self,
        job: &JobName,
        interval: Duration,
        max_attempts: u32,
        checks: &mut u32,
    ) -> Option<BatchJobStatus> {
        let mut last = None;
        for attempt in 0..max_attempts {
            if attempt > 0 {
                tokio::time::sleep(interval).await;
            }
            if let Some(status) = self.check_status(job, checks).await {
                last = Some(status);
                if status.is_terminal() {
                    break;
                }
            }
        }
        last
    }

    /// List job names in `scope`; empty if any page read fails.
    pub async fn list_jobs(&self, scope: &Scope) -> Vec<JobName> {
        let service = &*self.service;
        let result = drain_pages("batch_jobs", self.max_list_pages, move |token| {
            service.list_jobs_page(scope, token)
        })
        .await;

        result.unwrap_or_else(|err| {
            telemetry::record_listing_failure("batch_jobs", scope.parent(), &err);
            Vec::new()
        })
    }

    /// Delete `job`; an already-absent job counts as deleted.
    pub async fn delete_job(&self, job: &JobName) -> bool {
        match self.service.delete_job(job).await {
            Ok(()) => true,
            Err(err) if err.is_not_found() => {
                tracing::debug!(%job, "batch job already absent");
                true
            }
            Err(err) => {
                tracing::error!(%job, error = %err, "deleting batch job failed");
                false
            }
        }
    }
}
