use std::any::type_name;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tracing::Instrument;

use crate::canceller::Canceller;
use crate::catalog::JobCatalog;
use crate::config::OrchestratorConfig;
use crate::job::{JobName, LaunchMode, Scope};
use crate::launcher::Launcher;
use crate::monitor::ExecutionMonitor;
use crate::service::RemoteJobService;
use crate::telemetry;

use super::report::{CancelRecord, LaunchRecord, MonitorRecord, RunReport};

/// Token for asking a running workflow to stop at its next remote call.
#[derive(Clone, Debug)]
pub struct StopToken {
    inner: Arc<StopTokenInner>,
}

#[derive(Debug)]
struct StopTokenInner {
    stopped: AtomicBool,
    notify: Notify,
}

impl StopToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StopTokenInner {
                stopped: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Signal stop.
    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Wait until stopped.
    pub async fn stopped(&self) {
        let notified = self.inner.notify.notified();
        if self.is_stopped() {
            return;
        }
        notified.await;
    }
}

impl Default for StopToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives the full lifecycle of every job in a scope.
///
/// The run is strictly sequential: all wait-mode launches, then all
/// fire-and-forget launches, then monitoring and cancellation, each phase
/// visiting jobs in catalog order. Per-job failures are logged and never end
/// the run early.
pub struct Orchestrator<S: RemoteJobService + ?Sized> {
    config: OrchestratorConfig,
    catalog: JobCatalog<S>,
    launcher: Launcher<S>,
    monitor: ExecutionMonitor<S>,
    canceller: Canceller<S>,
    stop: StopToken,
}

impl<S: RemoteJobService + ?Sized> fmt::Debug for Orchestrator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("service_type", &type_name::<S>())
            .field("stopped", &self.stop.is_stopped())
            .finish()
    }
}

impl<S: RemoteJobService + ?Sized> Orchestrator<S> {
    pub fn new(config: OrchestratorConfig, service: Arc<S>, stop: StopToken) -> Self {
        let catalog =
            JobCatalog::new(Arc::clone(&service)).with_max_pages(config.max_list_pages);
        Self {
            launcher: Launcher::new(Arc::clone(&service), &config),
            monitor: ExecutionMonitor::new(catalog.clone()),
            canceller: Canceller::new(service),
            catalog,
            config,
            stop,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    pub fn catalog(&self) -> &JobCatalog<S> {
        &self.catalog
    }

    pub fn launcher(&self) -> &Launcher<S> {
        &self.launcher
    }

    pub fn monitor(&self) -> &ExecutionMonitor<S> {
        &self.monitor
    }

    pub fn canceller(&self) -> &Canceller<S> {
        &self.canceller
    }

    /// Run the lifecycle workflow over every job in `scope`.
    pub async fn run(&self, scope: &Scope) -> RunReport {
        let span = telemetry::run_span("jobs", scope.parent());
        self.run_phases(scope).instrument(span).await
    }

    async fn run_phases(&self, scope: &Scope) -> RunReport {
        let mut report = RunReport::new(scope.parent());

        if self.should_stop(&mut report) {
            report.finish();
            return report;
        }

        tracing::info!(%scope, "listing jobs");
        report.jobs = self.catalog.list_jobs(scope).await;
        tracing::info!(%scope, count = report.jobs.len(), "jobs listed");

        let jobs = report.jobs.clone();
        self.launch_all(&jobs, LaunchMode::WaitUntilDone, &mut report)
            .await;
        self.launch_all(&jobs, LaunchMode::FireAndForget, &mut report)
            .await;
        self.cancel_active(&jobs, &mut report).await;

        report.finish();
        tracing::info!(
            %scope,
            jobs = report.jobs.len(),
            failed_launches = report.failed_launches(),
            cancellations = report.cancellations.len(),
            failed_cancellations = report.failed_cancellations(),
            stopped = report.stopped,
            "run finished"
        );
        report
    }

    async fn launch_all(&self, jobs: &[JobName], mode: LaunchMode, report: &mut RunReport) {
        for job in jobs {
            if self.should_stop(report) {
                return;
            }

            match mode {
                LaunchMode::WaitUntilDone => {
                    tracing::info!(%job, "launching job and waiting for completion");
                }
                LaunchMode::FireAndForget => {
                    tracing::info!(%job, "launching job without waiting");
                }
            }
            let launched = self.launcher.launch(job, mode).await;

            let record = LaunchRecord {
                job: job.clone(),
                mode,
                launched,
            };
            match mode {
                LaunchMode::WaitUntilDone => report.wait_launches.push(record),
                LaunchMode::FireAndForget => report.fire_launches.push(record),
            }
        }
    }

    async fn cancel_active(&self, jobs: &[JobName], report: &mut RunReport) {
        for job in jobs {
            if self.should_stop(report) {
                return;
            }

            tracing::info!(%job, "listing active executions");
            let active = self.monitor.active_execution_names(job).await;
            report.monitored.push(MonitorRecord {
                job: job.clone(),
                active: active.clone(),
            });

            for execution in active {
                if self.should_stop(report) {
                    return;
                }

                tracing::info!(%job, %execution, "cancelling execution");
                let result = self.canceller.cancel_with_result(&execution).await;
                report.cancellations.push(CancelRecord {
                    job: job.clone(),
                    execution,
                    result,
                });
            }
        }
    }

    fn should_stop(&self, report: &mut RunReport) -> bool {
        if self.stop.is_stopped() {
            if !report.stopped {
                tracing::warn!(scope = %report.scope, "stop requested, skipping remaining steps");
            }
            report.stopped = true;
        }
        report.stopped
    }
}
