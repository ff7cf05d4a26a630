use std::io;

/// Errors from container lifecycle operations.
///
/// Every variant is fatal for the call that produced it: the launcher never
/// retries create/start/stop/remove, and never cleans up after a partial
/// start. Runtime implementations map their client errors into the variant
/// matching the step that failed.
#[derive(thiserror::Error, Debug)]
pub enum SandboxError {
    #[error("port allocation failed: {0}")]
    PortAllocation(#[source] io::Error),

    #[error("container runtime connection failed: {0}")]
    Connect(String),

    #[error("container create failed: {0}")]
    Create(String),

    #[error("container start failed: {0}")]
    Start(String),

    #[error("container stop failed: {0}")]
    Stop(String),

    #[error("container remove failed: {0}")]
    Remove(String),

    #[error("container not found: {0}")]
    NotFound(String),
}
