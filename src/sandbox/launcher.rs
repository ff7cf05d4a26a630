//! Instance lifecycle: allocate a port, create + start the container, wait
//! for readiness, and later stop + remove it.
//!
//! Failures are surfaced as soon as the runtime reports them. Nothing is
//! retried and nothing is cleaned up after a partial start; a container that
//! was created but failed to start is left for the caller to remove.
//!
//! A launcher holds one runtime connection for as long as it lives. Keeping
//! it across tests reuses that connection for every instance it starts.

use std::sync::Arc;

use crate::config::SandboxConfig;
use crate::retry::{Sleeper, TokioSleeper};

use super::docker::DockerRuntime;
use super::error::SandboxError;
use super::port::allocate_free_port;
use super::readiness::ReadinessPoller;
use super::runtime::ContainerRuntime;
use super::types::{ContainerSpec, InstanceHandle, StartedInstance};

pub struct Launcher {
    runtime: Arc<dyn ContainerRuntime>,
    poller: ReadinessPoller,
    sleeper: Arc<dyn Sleeper>,
    config: SandboxConfig,
}

impl Launcher {
    /// Connect to Docker as described by `config`.
    pub async fn connect(config: &SandboxConfig) -> Result<Self, SandboxError> {
        let runtime = DockerRuntime::connect(&config.docker).await?;
        Ok(Self::new(config, Arc::new(runtime)))
    }

    pub fn new(config: &SandboxConfig, runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self::with_sleeper(config, runtime, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(
        config: &SandboxConfig,
        runtime: Arc<dyn ContainerRuntime>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            runtime,
            poller: ReadinessPoller::with_sleeper(config.readiness.clone(), sleeper.clone()),
            sleeper,
            config: config.clone(),
        }
    }

    /// Settings this launcher was built from.
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Start a Dgraph container and wait for its HTTP service.
    ///
    /// `image` falls back to the configured default. The instance is
    /// returned whether or not it became ready; check
    /// [`StartedInstance::readiness`].
    pub async fn start(&self, image: Option<&str>) -> Result<StartedInstance, SandboxError> {
        let image = image
            .filter(|i| !i.trim().is_empty())
            .unwrap_or(self.config.image.as_str());
        let port = allocate_free_port()?;
        let spec = ContainerSpec::dgraph(image, port);

        tracing::info!(
            image = %spec.image,
            name = %spec.name,
            port = port,
            "starting dgraph container"
        );

        let container_id = self.runtime.create(&spec).await?;
        self.runtime.start(&container_id).await?;

        let handle = InstanceHandle::new(container_id, port);
        tracing::info!(
            container_id = %handle.container_id,
            port = port,
            "dgraph container started"
        );

        self.sleeper.sleep(self.config.start_grace).await;
        let readiness = self.poller.wait(&handle.base_url()).await;

        Ok(StartedInstance { handle, readiness })
    }

    pub async fn stop(&self, handle: &InstanceHandle) -> Result<(), SandboxError> {
        tracing::info!(container_id = %handle.container_id, "stopping dgraph container");
        self.runtime.stop(&handle.container_id).await
    }

    pub async fn remove(&self, handle: &InstanceHandle) -> Result<(), SandboxError> {
        tracing::info!(container_id = %handle.container_id, "removing dgraph container");
        self.runtime.remove(&handle.container_id).await
    }

    /// Stop, then remove. Stops at the first failure.
    pub async fn teardown(&self, handle: &InstanceHandle) -> Result<(), SandboxError> {
        self.stop(handle).await?;
        self.remove(handle).await
    }
}
