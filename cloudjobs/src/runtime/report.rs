use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::job::{CancellationResult, ExecutionName, JobName, LaunchMode};
use crate::service::BatchJobStatus;

#[derive(Clone, Debug, Serialize)]
pub struct LaunchRecord {
    pub job: JobName,
    pub mode: LaunchMode,
    pub launched: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct MonitorRecord {
    pub job: JobName,
    pub active: Vec<ExecutionName>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CancelRecord {
    pub job: JobName,
    pub execution: ExecutionName,
    pub result: CancellationResult,
}

/// Everything one orchestrator run did, in the order it did it.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub scope: String,
    pub jobs: Vec<JobName>,
    pub wait_launches: Vec<LaunchRecord>,
    pub fire_launches: Vec<LaunchRecord>,
    pub monitored: Vec<MonitorRecord>,
    pub cancellations: Vec<CancelRecord>,
    /// Set when a stop request cut the run short.
    pub stopped: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            jobs: Vec::new(),
            wait_launches: Vec::new(),
            fire_launches: Vec::new(),
            monitored: Vec::new(),
            cancellations: Vec::new(),
            stopped: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Number of launch, monitor and cancel requests issued.
    pub fn remote_calls(&self) -> usize {
        self.wait_launches.len()
            + self.fire_launches.len()
            + self.monitored.len()
            + self.cancellations.len()
    }

    pub fn failed_launches(&self) -> usize {
        self.wait_launches
            .iter()
            .chain(&self.fire_launches)
            .filter(|record| !record.launched)
            .count()
    }

    pub fn failed_cancellations(&self) -> usize {
        self.cancellations
            .iter()
            .filter(|record| !record.result.is_success())
            .count()
    }
}

/// Outcome of a batch workflow run.
#[derive(Clone, Debug, Serialize)]
pub struct BatchReport {
    pub scope: String,
    pub job: Option<JobName>,
    /// Last status read, if any read succeeded.
    pub status: Option<BatchJobStatus>,
    pub status_checks: u32,
    pub waited_ms: u128,
    pub listed_jobs: Vec<JobName>,
    pub deleted: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchReport {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            job: None,
            status: None,
            status_checks: 0,
            waited_ms: 0,
            listed_jobs: Vec::new(),
            deleted: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StorageStep {
    pub step: &'static str,
    pub ok: bool,
    pub detail: Option<String>,
}

/// Outcome of a storage demo run. Steps are independent of each other.
#[derive(Clone, Debug, Serialize)]
pub struct StorageReport {
    pub container: String,
    pub steps: Vec<StorageStep>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl StorageReport {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            steps: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn record(&mut self, step: &'static str, ok: bool, detail: Option<String>) {
        self.steps.push(StorageStep { step, ok, detail });
    }

    pub fn step(&self, name: &str) -> Option<&StorageStep> {
        self.steps.iter().find(|step| step.step == name)
    }

    pub fn all_ok(&self) -> bool {
        self.steps.iter().all(|step| step.ok)
    }
}
