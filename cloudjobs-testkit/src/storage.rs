use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use cloudjobs::memory::InMemoryObjectStore;
use cloudjobs::*;
use parking_lot::Mutex;

/// Storage operations that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageOp {
    Put,
    Get,
    List,
    Delete,
    CreateContainer,
    ListContainers,
    DeleteContainer,
}

/// [`InMemoryObjectStore`] wrapper failing the configured operations with
/// `Unavailable`, and counting every call.
#[derive(Clone, Default)]
pub struct FlakyObjectStore {
    inner: Arc<InMemoryObjectStore>,
    failing: Arc<Mutex<HashSet<StorageOp>>>,
    calls: Arc<Mutex<Vec<StorageOp>>>,
}

impl FlakyObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(self, op: StorageOp) -> Self {
        self.failing.lock().insert(op);
        self
    }

    pub fn calls(&self) -> Vec<StorageOp> {
        self.calls.lock().clone()
    }

    fn check(&self, op: StorageOp) -> Result<(), ServiceError> {
        self.calls.lock().push(op);
        if self.failing.lock().contains(&op) {
            return Err(ServiceError::unavailable(format!("{op:?} is failing")));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FlakyObjectStore {
    async fn put(&self, container: &str, path: &str, content: Vec<u8>) -> Result<(), ServiceError> {
        self.check(StorageOp::Put)?;
        ObjectStore::put(&*self.inner, container, path, content).await
    }

    async fn get(&self, container: &str, path: &str) -> Result<Option<Vec<u8>>, ServiceError> {
        self.check(StorageOp::Get)?;
        ObjectStore::get(&*self.inner, container, path).await
    }

    async fn list(
        &self,
        container: &str,
        prefix: Option<&str>,
        delimiter: Option<&str>,
    ) -> Result<Vec<String>, ServiceError> {
        self.check(StorageOp::List)?;
        ObjectStore::list(&*self.inner, container, prefix, delimiter).await
    }

    async fn delete(&self, container: &str, path: &str) -> Result<(), ServiceError> {
        self.check(StorageOp::Delete)?;
        ObjectStore::delete(&*self.inner, container, path).await
    }
}

#[async_trait]
impl ContainerRegistry for FlakyObjectStore {
    async fn create(&self, name: &str, config: &ContainerConfig) -> Result<(), ServiceError> {
        self.check(StorageOp::CreateContainer)?;
        ContainerRegistry::create(&*self.inner, name, config).await
    }

    async fn list(&self) -> Result<Vec<String>, ServiceError> {
        self.check(StorageOp::ListContainers)?;
        ContainerRegistry::list(&*self.inner).await
    }

    async fn delete(&self, name: &str) -> Result<(), ServiceError> {
        self.check(StorageOp::DeleteContainer)?;
        ContainerRegistry::delete(&*self.inner, name).await
    }
}
