use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::service::{ContainerConfig, ContainerRegistry, ObjectStore};
use crate::telemetry;

use super::report::StorageReport;

const DEMO_PREFIX: &str = "demo/";
const DEMO_OBJECT: &str = "demo/hello.txt";
const DEMO_CONTENT: &[u8] = b"hello from cloudjobs";

/// Exercise an object store end to end against an ephemeral container.
///
/// Each step is independent: a failure is logged and recorded, and the next
/// step still runs.
pub struct StorageWorkflow<O: ObjectStore + ?Sized, R: ContainerRegistry + ?Sized> {
    store: Arc<O>,
    registry: Arc<R>,
    container: String,
    container_config: ContainerConfig,
}

impl<O: ObjectStore + ?Sized, R: ContainerRegistry + ?Sized> StorageWorkflow<O, R> {
    /// A workflow over a freshly named `cloudjobs-demo-<uuid>` container.
    pub fn new(store: Arc<O>, registry: Arc<R>) -> Self {
        Self {
            store,
            registry,
            container: format!("cloudjobs-demo-{}", Uuid::new_v4().simple()),
            container_config: ContainerConfig::default(),
        }
    }

    pub fn with_container_name(mut self, name: impl Into<String>) -> Self {
        self.container = name.into();
        self
    }

    pub fn with_container_config(mut self, config: ContainerConfig) -> Self {
        self.container_config = config;
        self
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub async fn run(&self) -> StorageReport {
        let span = telemetry::run_span("storage", &self.container);
        self.run_steps().instrument(span).await
    }

    async fn run_steps(&self) -> StorageReport {
        let container = self.container.as_str();
        let mut report = StorageReport::new(container);

        tracing::info!(container, "creating container");
        let created = self.create_container().await;
        report.record("create_container", created, None);

        let listed = match self.registry.list().await {
            Ok(names) => {
                let found = names.iter().any(|name| name == container);
                report.record(
                    "list_containers",
                    found,
                    Some(format!("{} containers", names.len())),
                );
                found
            }
            Err(err) => {
                tracing::error!(error = %err, "listing containers failed");
                report.record("list_containers", false, Some(err.to_string()));
                false
            }
        };
        tracing::info!(container, listed, "container listing checked");

        tracing::info!(container, path = DEMO_OBJECT, "uploading object");
        let put = self.put_object(DEMO_OBJECT, DEMO_CONTENT.to_vec()).await;
        report.record("put_object", put, None);

        match self
            .store
            .list(container, Some(DEMO_PREFIX), Some("/"))
            .await
        {
            Ok(paths) => {
                let found = paths.iter().any(|path| path == DEMO_OBJECT);
                for path in &paths {
                    tracing::info!(container, %path, "object listed");
                }
                report.record("list_objects", found, Some(paths.join(",")));
            }
            Err(err) => {
                tracing::error!(container, error = %err, "listing objects failed");
                report.record("list_objects", false, Some(err.to_string()));
            }
        }

        match self.store.get(container, DEMO_OBJECT).await {
            Ok(Some(content)) => {
                let matches = content == DEMO_CONTENT;
                report.record(
                    "get_object",
                    matches,
                    Some(String::from_utf8_lossy(&content).into_owned()),
                );
            }
            Ok(None) => {
                tracing::warn!(container, path = DEMO_OBJECT, "object not found");
                report.record("get_object", false, Some("not found".to_string()));
            }
            Err(err) => {
                tracing::error!(container, error = %err, "reading object failed");
                report.record("get_object", false, Some(err.to_string()));
            }
        }

        let deleted = self.delete_object(DEMO_OBJECT).await;
        report.record("delete_object", deleted, None);
        let deleted_again = self.delete_object(DEMO_OBJECT).await;
        report.record("delete_object_again", deleted_again, None);

        tracing::info!(container, "deleting container");
        let removed = self.delete_container().await;
        report.record("delete_container", removed, None);
        let removed_again = self.delete_container().await;
        report.record("delete_container_again", removed_again, None);

        report.finish();
        tracing::info!(container, ok = report.all_ok(), "storage demo finished");
        report
    }

    pub async fn create_container(&self) -> bool {
        match self
            .registry
            .create(&self.container, &self.container_config)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(
                    container = %self.container,
                    error = %err,
                    "creating container failed"
                );
                false
            }
        }
    }

    pub async fn put_object(&self, path: &str, content: Vec<u8>) -> bool {
        match self.store.put(&self.container, path, content).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(container = %self.container, path, error = %err, "upload failed");
                false
            }
        }
    }

    /// Delete an object; an absent object counts as deleted.
    pub async fn delete_object(&self, path: &str) -> bool {
        match self.store.delete(&self.container, path).await {
            Ok(()) => true,
            Err(err) if err.is_not_found() => true,
            Err(err) => {
                tracing::error!(
                    container = %self.container,
                    path,
                    error = %err,
                    "object delete failed"
                );
                false
            }
        }
    }

    /// Delete the container; an absent container counts as deleted.
    pub async fn delete_container(&self) -> bool {
        match self.registry.delete(&self.container).await {
            Ok(()) => true,
            Err(err) if err.is_not_found() => true,
            Err(err) => {
                tracing::error!(
                    container = %self.container,
                    error = %err,
                    "container delete failed"
                );
                false
            }
        }
    }
}
