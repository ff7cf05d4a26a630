use async_trait::async_trait;

use super::error::SandboxError;
use super::types::{ContainerId, ContainerSpec};

/// Container lifecycle primitives the launcher drives.
///
/// Implementations are thin: no retries, no cleanup. Each call maps a
/// runtime failure into the `SandboxError` variant for that step.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create (but do not start) a container; returns its runtime id.
    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId, SandboxError>;

    async fn start(&self, id: &str) -> Result<(), SandboxError>;

    async fn stop(&self, id: &str) -> Result<(), SandboxError>;

    async fn remove(&self, id: &str) -> Result<(), SandboxError>;
}
