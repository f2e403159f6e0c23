//! Storage demo tests against the flaky object store.

use std::sync::Arc;

use cloudjobs::runtime::StorageWorkflow;
use cloudjobs_testkit::{FlakyObjectStore, StorageOp};

fn workflow(store: &FlakyObjectStore) -> StorageWorkflow<FlakyObjectStore, FlakyObjectStore> {
    StorageWorkflow::new(Arc::new(store.clone()), Arc::new(store.clone()))
}

#[tokio::test]
async fn demo_runs_every_step() {
    let store = FlakyObjectStore::new();
    let workflow = workflow(&store);
    assert!(workflow.container().starts_with("cloudjobs-demo-"));

    let report = workflow.run().await;

    assert!(report.all_ok(), "{report:?}");
    let steps: Vec<_> = report.steps.iter().map(|step| step.step).collect();
    assert_eq!(
        steps,
        vec![
            "create_container",
            "list_containers",
            "put_object",
            "list_objects",
            "get_object",
            "delete_object",
            "delete_object_again",
            "delete_container",
            "delete_container_again",
        ]
    );
    assert_eq!(
        report.step("get_object").and_then(|step| step.detail.as_deref()),
        Some("hello from cloudjobs")
    );

    let finished_at = report.finished_at.expect("run finished");
    assert!(finished_at >= report.started_at);
}

#[tokio::test]
async fn container_names_are_unique() {
    let store = FlakyObjectStore::new();
    assert_ne!(workflow(&store).container(), workflow(&store).container());
}

#[tokio::test]
async fn deleting_a_container_twice_succeeds_both_times() {
    let store = FlakyObjectStore::new();
    let workflow = workflow(&store).with_container_name("scratch");

    assert!(workflow.create_container().await);
    assert!(workflow.delete_container().await);
    assert!(workflow.delete_container().await);
}

#[tokio::test]
async fn failed_upload_does_not_stop_later_steps() {
    let store = FlakyObjectStore::new().failing(StorageOp::Put);
    let report = workflow(&store).run().await;

    assert!(!report.all_ok());
    assert!(!report.step("put_object").unwrap().ok);
    assert!(!report.step("get_object").unwrap().ok);
    assert!(report.step("delete_object").unwrap().ok);
    assert!(report.step("delete_container").unwrap().ok);
    assert!(report.step("delete_container_again").unwrap().ok);
    assert_eq!(report.steps.len(), 9);
}

#[tokio::test]
async fn failing_deletes_are_reported() {
    let store = FlakyObjectStore::new()
        .failing(StorageOp::Delete)
        .failing(StorageOp::DeleteContainer);
    let report = workflow(&store).run().await;

    assert!(report.step("get_object").unwrap().ok);
    assert!(!report.step("delete_object").unwrap().ok);
    assert!(!report.step("delete_object_again").unwrap().ok);
    assert!(!report.step("delete_container").unwrap().ok);
    assert_eq!(
        store
            .calls()
            .iter()
            .filter(|op| **op == StorageOp::DeleteContainer)
            .count(),
        2
    );
}
