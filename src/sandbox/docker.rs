//! Docker Engine backend for [`ContainerRuntime`], built on bollard.
//!
//! Connection settings come from an explicit [`DockerConfig`] rather than the
//! process environment, so tests and parallel runs can point at different
//! daemons. The API version is negotiated with the daemon at connect time.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, RemoveContainerOptions, StartContainerOptions,
    StopContainerOptions,
};
use bollard::models::{HostConfig, PortBinding};
use bollard::{API_DEFAULT_VERSION, Docker};

use super::error::SandboxError;
use super::runtime::ContainerRuntime;
use super::types::{ContainerId, ContainerSpec};

/// Client-side request timeout handed to bollard, in seconds.
const CLIENT_TIMEOUT_SECS: u64 = 120;

// ── Config ──────────────────────────────────────────────────────────

/// Where and how to reach the Docker daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockerConfig {
    /// `unix:///path`, `tcp://host:port` or `http://host:port`. `None` uses
    /// the platform default socket.
    pub host: Option<String>,
    pub tls_verify: bool,
    /// Directory holding `ca.pem`, `cert.pem` and `key.pem`. Setting it turns
    /// on TLS for tcp hosts even without `tls_verify`. The server certificate
    /// is always checked against `ca.pem`; there is no skip-verify mode.
    pub cert_path: Option<PathBuf>,
}

/// Resolved connection method for a [`DockerConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum Endpoint {
    LocalDefaults,
    Unix(String),
    Http(String),
    Tls {
        addr: String,
        key: PathBuf,
        cert: PathBuf,
        ca: PathBuf,
    },
}

impl DockerConfig {
    fn endpoint(&self) -> Result<Endpoint, SandboxError> {
        let Some(host) = self.host.as_deref().filter(|h| !h.is_empty()) else {
            return Ok(Endpoint::LocalDefaults);
        };

        if host.starts_with("unix://") {
            return Ok(Endpoint::Unix(host.to_string()));
        }

        if self.tls_verify || self.cert_path.is_some() {
            let dir = self
                .cert_path
                .clone()
                .or_else(|| dirs::home_dir().map(|home| home.join(".docker")))
                .ok_or_else(|| {
                    SandboxError::Connect(
                        "TLS requested but no certificate directory could be resolved".into(),
                    )
                })?;
            return Ok(Endpoint::Tls {
                addr: host.to_string(),
                key: dir.join("key.pem"),
                cert: dir.join("cert.pem"),
                ca: dir.join("ca.pem"),
            });
        }

        Ok(Endpoint::Http(host.to_string()))
    }
}

// ── Runtime ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect to the daemon and negotiate the API version.
    pub async fn connect(config: &DockerConfig) -> Result<Self, SandboxError> {
        let endpoint = config.endpoint()?;
        tracing::debug!(endpoint = ?endpoint, "connecting to docker daemon");

        let docker = match &endpoint {
            Endpoint::LocalDefaults => Docker::connect_with_local_defaults(),
            Endpoint::Unix(path) => {
                Docker::connect_with_unix(path, CLIENT_TIMEOUT_SECS, API_DEFAULT_VERSION)
            }
            Endpoint::Http(addr) => {
                Docker::connect_with_http(addr, CLIENT_TIMEOUT_SECS, API_DEFAULT_VERSION)
            }
            Endpoint::Tls {
                addr,
                key,
                cert,
                ca,
            } => Docker::connect_with_ssl(
                addr,
                key,
                cert,
                ca,
                CLIENT_TIMEOUT_SECS,
                API_DEFAULT_VERSION,
            ),
        }
        .map_err(|e| SandboxError::Connect(e.to_string()))?;

        let docker = docker
            .negotiate_version()
            .await
            .map_err(|e| SandboxError::Connect(format!("API version negotiation failed: {e}")))?;

        Ok(Self { docker })
    }
}

/// Translate a spec into bollard's create-container body.
fn container_config(spec: &ContainerSpec) -> Config<String> {
    let exposed_ports = spec
        .exposed_ports
        .iter()
        .map(|port| (port.clone(), HashMap::new()))
        .collect::<HashMap<_, _>>();

    let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
    for mapping in &spec.port_bindings {
        port_bindings
            .entry(mapping.container_key())
            .or_insert_with(|| Some(Vec::new()))
            .get_or_insert_with(Vec::new)
            .push(PortBinding {
                host_ip: Some(mapping.host_ip.to_string()),
                host_port: Some(mapping.host_port.to_string()),
            });
    }

    let labels = spec
        .labels
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect::<HashMap<_, _>>();

    Config {
        image: Some(spec.image.clone()),
        env: Some(spec.env.clone()),
        exposed_ports: Some(exposed_ports),
        labels: Some(labels),
        host_config: Some(HostConfig {
            port_bindings: Some(port_bindings),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Docker answers 404 for unknown container ids.
fn is_not_found(err: &bollard::errors::Error) -> bool {
    matches!(
        err,
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId, SandboxError> {
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };

        let created = self
            .docker
            .create_container(Some(options), container_config(spec))
            .await
            .map_err(|e| SandboxError::Create(format!("{} ({}): {e}", spec.name, spec.image)))?;

        for warning in &created.warnings {
            tracing::warn!(container_id = %created.id, warning = %warning, "docker create warning");
        }

        Ok(created.id)
    }

    async fn start(&self, id: &str) -> Result<(), SandboxError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| match e {
                e if is_not_found(&e) => SandboxError::NotFound(id.to_string()),
                e => SandboxError::Start(format!("{id}: {e}")),
            })
    }

    async fn stop(&self, id: &str) -> Result<(), SandboxError> {
        self.docker
            .stop_container(id, None::<StopContainerOptions>)
            .await
            .map_err(|e| match e {
                e if is_not_found(&e) => SandboxError::NotFound(id.to_string()),
                e => SandboxError::Stop(format!("{id}: {e}")),
            })
    }

    async fn remove(&self, id: &str) -> Result<(), SandboxError> {
        self.docker
            .remove_container(id, None::<RemoveContainerOptions>)
            .await
            .map_err(|e| match e {
                e if is_not_found(&e) => SandboxError::NotFound(id.to_string()),
                e => SandboxError::Remove(format!("{id}: {e}")),
            })
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_host_uses_local_defaults() {
        let config = DockerConfig::default();
        assert_eq!(config.endpoint().unwrap(), Endpoint::LocalDefaults);

        let config = DockerConfig {
            host: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.endpoint().unwrap(), Endpoint::LocalDefaults);
    }

    #[test]
    fn unix_host_ignores_tls() {
        let config = DockerConfig {
            host: Some("unix:///var/run/docker.sock".into()),
            tls_verify: true,
            cert_path: None,
        };
        assert_eq!(
            config.endpoint().unwrap(),
            Endpoint::Unix("unix:///var/run/docker.sock".into())
        );
    }

    #[test]
    fn tcp_host_without_tls_is_http() {
        let config = DockerConfig {
            host: Some("tcp://10.0.0.5:2375".into()),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint().unwrap(),
            Endpoint::Http("tcp://10.0.0.5:2375".into())
        );
    }

    #[test]
    fn tls_uses_cert_path_files() {
        let config = DockerConfig {
            host: Some("tcp://10.0.0.5:2376".into()),
            tls_verify: true,
            cert_path: Some(PathBuf::from("/certs")),
        };
        assert_eq!(
            config.endpoint().unwrap(),
            Endpoint::Tls {
                addr: "tcp://10.0.0.5:2376".into(),
                key: PathBuf::from("/certs/key.pem"),
                cert: PathBuf::from("/certs/cert.pem"),
                ca: PathBuf::from("/certs/ca.pem"),
            }
        );
    }

    #[test]
    fn cert_path_alone_enables_tls() {
        let config = DockerConfig {
            host: Some("tcp://10.0.0.5:2376".into()),
            tls_verify: false,
            cert_path: Some(PathBuf::from("/certs")),
        };
        assert!(matches!(
            config.endpoint().unwrap(),
            Endpoint::Tls { ref ca, .. } if ca == &PathBuf::from("/certs/ca.pem")
        ));
    }

    #[test]
    fn container_config_publishes_service_port() {
        let spec = ContainerSpec::dgraph("", 41234);
        let config = container_config(&spec);

        assert_eq!(config.image.as_deref(), Some("dgraph/standalone:v21.03.2"));
        assert!(config.exposed_ports.unwrap().contains_key("41234/tcp"));

        let bindings = config.host_config.unwrap().port_bindings.unwrap();
        let service = bindings["8080/tcp"].as_ref().unwrap();
        assert_eq!(service.len(), 1);
        assert_eq!(service[0].host_ip.as_deref(), Some("0.0.0.0"));
        assert_eq!(service[0].host_port.as_deref(), Some("41234"));
    }

    #[test]
    fn container_config_carries_labels() {
        let spec = ContainerSpec::dgraph("", 41234);
        let config = container_config(&spec);
        let labels = config.labels.unwrap();
        assert_eq!(
            labels.get("dgraph-sandbox.managed").map(String::as_str),
            Some("true")
        );
    }

    #[test]
    fn not_found_detection() {
        let err = bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            message: "No such container: abc".into(),
        };
        assert!(is_not_found(&err));

        let err = bollard::errors::Error::DockerResponseServerError {
            status_code: 500,
            message: "boom".into(),
        };
        assert!(!is_not_found(&err));
    }
}
