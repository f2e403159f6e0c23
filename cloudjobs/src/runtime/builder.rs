use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use crate::config::OrchestratorConfig;
use crate::service::RemoteJobService;

use super::driver::{Orchestrator, StopToken};

/// Builder for constructing an [`Orchestrator`] with explicit dependencies.
///
/// # Example
///
/// ```ignore
/// use cloudjobs::runtime::OrchestratorBuilder;
///
/// let orchestrator = OrchestratorBuilder::new(config)
///     .with_service(service)
///     .with_stop_token(stop)
///     .build()?;
/// ```
pub struct OrchestratorBuilder<S: RemoteJobService + ?Sized> {
    config: OrchestratorConfig,
    service: Option<Arc<S>>,
    stop: Option<StopToken>,
}

impl<S: RemoteJobService + ?Sized> fmt::Debug for OrchestratorBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("OrchestratorBuilder");
        debug.field("config", &self.config);
        debug.field("service_set", &self.service.is_some());
        debug.field("stop_token_set", &self.stop.is_some());

        if self.service.is_some() {
            debug.field("service_type", &type_name::<S>());
        }

        debug.finish()
    }
}

impl<S: RemoteJobService + ?Sized> OrchestratorBuilder<S> {
    /// Create a new builder with the given configuration.
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            config,
            service: None,
            stop: None,
        }
    }

    /// Replace the configuration given to [`OrchestratorBuilder::new`].
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the remote job service.
    pub fn with_service(mut self, service: Arc<S>) -> Self {
        self.service = Some(service);
        self
    }

    /// Share a stop token with the caller. A fresh one is created otherwise.
    pub fn with_stop_token(mut self, stop: StopToken) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if the service dependency is missing.
    pub fn build(self) -> anyhow::Result<Orchestrator<S>> {
        let service = self
            .service
            .ok_or_else(|| anyhow::anyhow!("service dependency missing"))?;
        let stop = self.stop.unwrap_or_default();

        Ok(Orchestrator::new(self.config, service, stop))
    }
}
