//! Launch, monitor and cancel executions of every job in a scope.
//!
//! Usage: `cloudjobs-run <project> <region> [--fixture jobs.json]`

use std::sync::Arc;

use clap::Parser;
use cloudjobs::cli::{self, RunArgs};
use cloudjobs::memory::{InMemoryJobService, JobFixture};
use cloudjobs::runtime::{OrchestratorBuilder, StopToken};
use cloudjobs::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = RunArgs::parse();
    telemetry::init()?;

    let scope = args.scope();
    let service = Arc::new(InMemoryJobService::new());
    if let Some(path) = &args.fixture {
        let fixture = JobFixture::load(path)?;
        service.seed(&scope, &fixture).await;
    }

    let stop = StopToken::new();
    cli::stop_on_ctrl_c(stop.clone());

    let orchestrator = OrchestratorBuilder::new(args.config())
        .with_service(service)
        .with_stop_token(stop)
        .build()?;

    let report = orchestrator.run(&scope).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if let Some(metrics) = telemetry::metrics_text()? {
        eprintln!("{metrics}");
    }
    Ok(())
}
