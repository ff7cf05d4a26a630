use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::sandbox::DockerConfig;
use crate::sandbox::types::DEFAULT_IMAGE;

/// Pause between container start and the first readiness poll.
pub const DEFAULT_START_GRACE: Duration = Duration::from_secs(1);

/// Pause after a successful schema install so it propagates internally.
pub const DEFAULT_SCHEMA_SETTLE: Duration = Duration::from_millis(500);

/// Everything the launcher and admin client need, resolved up front.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxConfig {
    pub docker: DockerConfig,
    pub image: String,
    pub readiness: RetryPolicy,
    pub schema_retry: RetryPolicy,
    pub start_grace: Duration,
    pub schema_settle: Duration,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            docker: DockerConfig::default(),
            image: DEFAULT_IMAGE.to_string(),
            readiness: RetryPolicy::default(),
            schema_retry: RetryPolicy::default(),
            start_grace: DEFAULT_START_GRACE,
            schema_settle: DEFAULT_SCHEMA_SETTLE,
        }
    }
}

impl SandboxConfig {
    pub fn from_env() -> Self {
        Self::from_raw_values(
            std::env::var("DOCKER_HOST").ok().as_deref(),
            std::env::var("DOCKER_TLS_VERIFY").ok().as_deref(),
            std::env::var("DOCKER_CERT_PATH").ok().as_deref(),
            std::env::var("DGRAPH_SANDBOX_IMAGE").ok().as_deref(),
        )
    }

    /// Build a config from raw string values (as they would come from env vars).
    /// Used directly in tests to avoid mutating process-global environment.
    pub fn from_raw_values(
        docker_host: Option<&str>,
        tls_verify: Option<&str>,
        cert_path: Option<&str>,
        image: Option<&str>,
    ) -> Self {
        let host = docker_host.filter(|s| !s.is_empty()).map(String::from);

        // Docker treats any non-empty DOCKER_TLS_VERIFY other than "0" as on.
        let tls_verify = tls_verify
            .map(str::trim)
            .is_some_and(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"));

        let cert_path = cert_path.filter(|s| !s.is_empty()).map(PathBuf::from);

        let image = image
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .unwrap_or_else(|| DEFAULT_IMAGE.to_string());

        SandboxConfig {
            docker: DockerConfig {
                host,
                tls_verify,
                cert_path,
            },
            image,
            ..SandboxConfig::default()
        }
    }
}
