//! Create a batch job, wait a fixed delay, inspect it and delete it.
//!
//! Usage: `cloudjobs-batch <project> <region> [--poll-delay-seconds 30]`

use std::sync::Arc;

use clap::Parser;
use cloudjobs::cli::BatchArgs;
use cloudjobs::memory::InMemoryBatchService;
use cloudjobs::runtime::BatchWorkflow;
use cloudjobs::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = BatchArgs::parse();
    telemetry::init()?;

    let scope = args.scope();
    let spec = args.spec();
    let workflow = BatchWorkflow::new(Arc::new(InMemoryBatchService::new()), args.config());

    let report = workflow.run(&scope, &spec).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if let Some(metrics) = telemetry::metrics_text()? {
        eprintln!("{metrics}");
    }
    Ok(())
}
