//! Command-line contracts of the binaries.
//!
//! Every workflow takes its scope as exactly two positional arguments. An
//! arity mismatch is a usage error: clap prints the usage and exits with
//! status 2 before any remote call is made.

use std::path::PathBuf;

use clap::Parser;
use uuid::Uuid;

use crate::config::{BatchConfig, OrchestratorConfig};
use crate::job::Scope;
use crate::runtime::StopToken;
use crate::service::BatchJobSpec;

/// Launch, monitor and cancel executions of every job in a scope.
#[derive(Debug, Parser)]
#[command(name = "cloudjobs-run", version)]
pub struct RunArgs {
    /// Project owning the jobs
    pub project: String,

    /// Region the jobs live in
    pub region: String,

    /// JSON fixture seeding the simulated provider
    #[arg(long)]
    pub fixture: Option<PathBuf>,

    /// Interval between polls of a start operation, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub operation_poll_interval_ms: u64,

    /// Give up waiting on a start operation after this many polls
    #[arg(long)]
    pub max_operation_polls: Option<u32>,
}

impl RunArgs {
    pub fn scope(&self) -> Scope {
        Scope::new(&self.project, &self.region)
    }

    pub fn config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            operation_poll_interval_ms: self.operation_poll_interval_ms,
            max_operation_polls: self.max_operation_polls,
            ..OrchestratorConfig::default()
        }
    }
}

/// Create a batch job, wait, inspect it and clean it up.
#[derive(Debug, Parser)]
#[command(name = "cloudjobs-batch", version)]
pub struct BatchArgs {
    /// Project owning the jobs
    pub project: String,

    /// Region the jobs live in
    pub region: String,

    /// Fixed delay between job creation and inspection, in seconds
    #[arg(long, default_value_t = 30)]
    pub poll_delay_seconds: u64,

    /// Job id to create; generated when omitted
    #[arg(long)]
    pub job_id: Option<String>,

    /// Script each task runs
    #[arg(long, default_value = "echo hello from cloudjobs")]
    pub script: String,

    /// Number of tasks in the job
    #[arg(long, default_value_t = 1)]
    pub task_count: u32,
}

impl BatchArgs {
    pub fn scope(&self) -> Scope {
        Scope::new(&self.project, &self.region)
    }

    pub fn config(&self) -> BatchConfig {
        BatchConfig::default().with_poll_delay_seconds(self.poll_delay_seconds)
    }

    pub fn spec(&self) -> BatchJobSpec {
        let job_id = self
            .job_id
            .clone()
            .unwrap_or_else(|| format!("cloudjobs-batch-{}", Uuid::new_v4().simple()));
        BatchJobSpec::new(job_id, &self.script)
            .with_tasks(self.task_count, self.task_count)
            .with_label("created-by", "cloudjobs")
    }
}

/// Exercise object storage against an ephemeral container.
#[derive(Debug, Parser)]
#[command(name = "cloudjobs-storage", version)]
pub struct StorageArgs {}

/// Stop `token` when the process receives Ctrl-C.
pub fn stop_on_ctrl_c(token: StopToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current call");
            token.stop();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn run_args_take_exactly_two_positionals() {
        let args = RunArgs::try_parse_from(["cloudjobs-run", "acme", "us-east1"]).unwrap();
        assert_eq!(args.scope(), Scope::new("acme", "us-east1"));
        assert_eq!(args.config().operation_poll_interval_ms, 1000);

        let missing = RunArgs::try_parse_from(["cloudjobs-run", "acme"]).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(missing.exit_code(), 2);

        let extra =
            RunArgs::try_parse_from(["cloudjobs-run", "acme", "us-east1", "more"]).unwrap_err();
        assert_eq!(extra.kind(), ErrorKind::UnknownArgument);
        assert_eq!(extra.exit_code(), 2);
    }

    #[test]
    fn batch_args_default_to_thirty_second_delay() {
        let args = BatchArgs::try_parse_from(["cloudjobs-batch", "acme", "us-east1"]).unwrap();
        assert_eq!(args.config().poll_delay_seconds, 30);
        assert!(args.spec().job_id.starts_with("cloudjobs-batch-"));

        let args = BatchArgs::try_parse_from([
            "cloudjobs-batch",
            "acme",
            "us-east1",
            "--poll-delay-seconds",
            "5",
            "--job-id",
            "nightly",
        ])
        .unwrap();
        assert_eq!(args.config().poll_delay_seconds, 5);
        assert_eq!(args.spec().job_id, "nightly");
    }

    #[test]
    fn storage_args_reject_positionals() {
        assert!(StorageArgs::try_parse_from(["cloudjobs-storage"]).is_ok());
        let err = StorageArgs::try_parse_from(["cloudjobs-storage", "extra"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
