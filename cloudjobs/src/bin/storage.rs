//! Put, list, get and delete an object in an ephemeral container.
//!
//! Usage: `cloudjobs-storage`

use std::sync::Arc;

use clap::Parser;
use cloudjobs::cli::StorageArgs;
use cloudjobs::memory::InMemoryObjectStore;
use cloudjobs::runtime::StorageWorkflow;
use cloudjobs::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    StorageArgs::parse();
    telemetry::init()?;

    let store = Arc::new(InMemoryObjectStore::new());
    let workflow = StorageWorkflow::new(Arc::clone(&store), store);

    let report = workflow.run().await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if let Some(metrics) = telemetry::metrics_text()? {
        eprintln!("{metrics}");
    }
    Ok(())
}
