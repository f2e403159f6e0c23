//! Batch workflow tests under paused tokio time.

use std::sync::Arc;
use std::time::Duration;

use cloudjobs::memory::InMemoryBatchService;
use cloudjobs::runtime::BatchWorkflow;
use cloudjobs::*;
use cloudjobs_testkit::{BatchCall, RecordingBatchService, test_scope};

fn spec() -> BatchJobSpec {
    BatchJobSpec::new("nightly", "echo hello").with_tasks(4, 2)
}

#[tokio::test(start_paused = true)]
async fn fixed_delay_inspects_once_after_the_delay() {
    let scope = test_scope();
    let service = Arc::new(
        RecordingBatchService::new().with_statuses([BatchJobStatus::Running]),
    );
    let workflow = BatchWorkflow::new(Arc::clone(&service), BatchConfig::default());

    let report = workflow.run(&scope, &spec()).await;

    let job = scope.job_name("nightly");
    assert_eq!(report.job, Some(job.clone()));
    assert_eq!(report.status, Some(BatchJobStatus::Running));
    assert_eq!(report.status_checks, 1);
    assert_eq!(report.waited_ms, 30_000);
    assert_eq!(report.listed_jobs, vec![job.clone()]);
    assert!(report.deleted);

    let calls = service.timed_calls();
    let kinds: Vec<_> = calls.iter().map(|(_, call)| call.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            BatchCall::CreateJob {
                scope: scope.parent(),
                job_id: "nightly".to_string(),
            },
            BatchCall::GetJob { job: job.clone() },
            BatchCall::ListJobs {
                scope: scope.parent(),
            },
            BatchCall::DeleteJob { job },
        ]
    );
    assert_eq!(calls[1].0 - calls[0].0, Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn configured_delay_is_honoured() {
    let scope = test_scope();
    let service = Arc::new(RecordingBatchService::new());
    let workflow = BatchWorkflow::new(
        Arc::clone(&service),
        BatchConfig::default().with_poll_delay_seconds(5),
    );

    let report = workflow.run(&scope, &spec()).await;

    assert_eq!(report.waited_ms, 5_000);
    assert_eq!(report.status, Some(BatchJobStatus::Queued));
}

#[tokio::test(start_paused = true)]
async fn until_terminal_stops_at_the_first_terminal_status() {
    let scope = test_scope();
    let service = Arc::new(RecordingBatchService::new().with_statuses([
        BatchJobStatus::Queued,
        BatchJobStatus::Running,
        BatchJobStatus::Succeeded,
        BatchJobStatus::Failed,
    ]));
    let config = BatchConfig::default().with_strategy(PollingStrategy::UntilTerminal {
        interval_ms: 2_000,
        max_attempts: 10,
    });
    let workflow = BatchWorkflow::new(Arc::clone(&service), config);

    let report = workflow.run(&scope, &spec()).await;

    assert_eq!(report.status, Some(BatchJobStatus::Succeeded));
    assert_eq!(report.status_checks, 3);
    assert_eq!(report.waited_ms, 4_000);
}

#[tokio::test(start_paused = true)]
async fn until_terminal_is_bounded() {
    let scope = test_scope();
    let service = Arc::new(RecordingBatchService::new().with_statuses([BatchJobStatus::Running]));
    let config = BatchConfig::default().with_strategy(PollingStrategy::UntilTerminal {
        interval_ms: 1_000,
        max_attempts: 3,
    });
    let workflow = BatchWorkflow::new(Arc::clone(&service), config);

    let report = workflow.run(&scope, &spec()).await;

    assert_eq!(report.status, Some(BatchJobStatus::Running));
    assert_eq!(report.status_checks, 3);
}

#[tokio::test(start_paused = true)]
async fn failed_creation_skips_inspection_and_cleanup() {
    let scope = test_scope();
    let service = Arc::new(
        RecordingBatchService::new().fail_create(ServiceError::QuotaExceeded {
            message: "cpus".to_string(),
        }),
    );
    let workflow = BatchWorkflow::new(Arc::clone(&service), BatchConfig::default());

    let report = workflow.run(&scope, &spec()).await;

    assert!(report.job.is_none());
    assert_eq!(report.status_checks, 0);
    assert!(!report.deleted);
    assert_eq!(
        service.calls(),
        vec![
            BatchCall::CreateJob {
                scope: scope.parent(),
                job_id: "nightly".to_string(),
            },
            BatchCall::ListJobs {
                scope: scope.parent(),
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_listing_still_cleans_up() {
    let scope = test_scope();
    let service = Arc::new(
        RecordingBatchService::new().fail_list(ServiceError::unavailable("down")),
    );
    let workflow = BatchWorkflow::new(Arc::clone(&service), BatchConfig::default());

    let report = workflow.run(&scope, &spec()).await;

    assert!(report.listed_jobs.is_empty());
    assert!(report.deleted);
}

#[tokio::test(start_paused = true)]
async fn job_can_be_kept_after_inspection() {
    let scope = test_scope();
    let service = Arc::new(InMemoryBatchService::new());
    let config = BatchConfig {
        delete_after_inspection: false,
        ..BatchConfig::default()
    };
    let workflow = BatchWorkflow::new(Arc::clone(&service), config);

    let report = workflow.run(&scope, &spec()).await;

    assert!(!report.deleted);
    assert_eq!(workflow.list_jobs(&scope).await, vec![scope.job_name("nightly")]);
}

#[tokio::test]
async fn deleting_a_batch_job_twice_succeeds_both_times() {
    let scope = test_scope();
    let service = Arc::new(InMemoryBatchService::new());
    let job = service.create_job(&scope, &spec()).await.unwrap();
    service.set_status(&job, BatchJobStatus::Succeeded).await;
    let workflow = BatchWorkflow::new(Arc::clone(&service), BatchConfig::default());

    assert!(workflow.delete_job(&job).await);
    assert!(workflow.delete_job(&job).await);
    assert!(workflow.list_jobs(&scope).await.is_empty());
}
