pub mod docker;
pub mod error;
pub mod launcher;
pub mod port;
pub mod readiness;
pub mod runtime;
pub mod types;

pub use docker::{DockerConfig, DockerRuntime};
pub use error::SandboxError;
pub use launcher::Launcher;
pub use port::allocate_free_port;
pub use readiness::{ReadinessPoller, local_http_client};
pub use runtime::ContainerRuntime;
pub use types::*;
