use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Constants ───────────────────────────────────────────────────────

/// Image used when the caller does not name one. Must already be in the
/// local image cache (`docker pull dgraph/standalone:v21.03.2`).
pub const DEFAULT_IMAGE: &str = "dgraph/standalone:v21.03.2";

/// Port the Dgraph HTTP service listens on inside the container.
pub const SERVICE_PORT: u16 = 8080;

/// Host interface the published port is bound to.
pub const BIND_ADDRESS: &str = "0.0.0.0";

/// Label put on every container this crate creates.
pub const MANAGED_LABEL: &str = "dgraph-sandbox.managed";

pub type ContainerId = String;

// ── Container spec (input to create) ────────────────────────────────

/// One host → container TCP port publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub host_ip: &'static str,
    pub host_port: u16,
    pub container_port: u16,
}

impl PortMapping {
    /// Docker's `"<port>/tcp"` key for the container side.
    pub fn container_key(&self) -> String {
        format!("{}/tcp", self.container_port)
    }
}

#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub exposed_ports: Vec<String>,
    pub port_bindings: Vec<PortMapping>,
    pub env: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

impl ContainerSpec {
    /// Spec for a standalone Dgraph published on `host_port`.
    ///
    /// An empty `image` falls back to [`DEFAULT_IMAGE`]. The exposed-port set
    /// names the host port, matching what the published mapping advertises.
    pub fn dgraph(image: &str, host_port: u16) -> Self {
        let image = if image.trim().is_empty() {
            DEFAULT_IMAGE.to_string()
        } else {
            image.to_string()
        };

        let mut labels = BTreeMap::new();
        labels.insert(MANAGED_LABEL.to_string(), "true".to_string());

        Self {
            name: format!("dgraph-sandbox-{}", uuid::Uuid::new_v4()),
            image,
            exposed_ports: vec![format!("{host_port}/tcp")],
            port_bindings: vec![PortMapping {
                host_ip: BIND_ADDRESS,
                host_port,
                container_port: SERVICE_PORT,
            }],
            env: vec![],
            labels,
        }
    }
}

// ── Running instance ────────────────────────────────────────────────

/// A started container and the host port its HTTP service is published on.
///
/// Valid until both stop and remove have succeeded; do not reuse afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceHandle {
    pub container_id: ContainerId,
    pub port: u16,
}

impl InstanceHandle {
    pub fn new(container_id: impl Into<ContainerId>, port: u16) -> Self {
        Self {
            container_id: container_id.into(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

/// Result of waiting for the instance's HTTP service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// `GET /` answered 200 on attempt number `attempts`.
    Ready { attempts: u32 },
    /// Every attempt failed; the instance may still come up later.
    NotReady { attempts: u32 },
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready { .. })
    }

    pub fn attempts(&self) -> u32 {
        match *self {
            Readiness::Ready { attempts } | Readiness::NotReady { attempts } => attempts,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StartedInstance {
    pub handle: InstanceHandle,
    pub readiness: Readiness,
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_image_uses_default() {
        let spec = ContainerSpec::dgraph("", 40123);
        assert_eq!(spec.image, DEFAULT_IMAGE);
        let spec = ContainerSpec::dgraph("  ", 40123);
        assert_eq!(spec.image, DEFAULT_IMAGE);
    }

    #[test]
    fn explicit_image_is_kept() {
        let spec = ContainerSpec::dgraph("dgraph/standalone:v23.1.0", 40123);
        assert_eq!(spec.image, "dgraph/standalone:v23.1.0");
    }

    #[test]
    fn dgraph_spec_maps_service_port() {
        let spec = ContainerSpec::dgraph("", 40123);
        assert_eq!(spec.exposed_ports, vec!["40123/tcp".to_string()]);
        assert_eq!(spec.port_bindings.len(), 1);
        let binding = spec.port_bindings[0];
        assert_eq!(binding.host_ip, "0.0.0.0");
        assert_eq!(binding.host_port, 40123);
        assert_eq!(binding.container_key(), "8080/tcp");
    }

    #[test]
    fn dgraph_spec_is_labelled_and_uniquely_named() {
        let a = ContainerSpec::dgraph("", 1);
        let b = ContainerSpec::dgraph("", 1);
        assert!(a.name.starts_with("dgraph-sandbox-"));
        assert_ne!(a.name, b.name);
        assert_eq!(a.labels.get(MANAGED_LABEL).map(String::as_str), Some("true"));
    }

    #[test]
    fn handle_base_url() {
        let handle = InstanceHandle::new("abc", 41000);
        assert_eq!(handle.base_url(), "http://localhost:41000");
    }

    #[test]
    fn handle_serializes_to_json() {
        let handle = InstanceHandle::new("abc", 41000);
        let json = serde_json::to_value(&handle).unwrap();
        assert_eq!(json["container_id"], "abc");
        assert_eq!(json["port"], 41000);
        let back: InstanceHandle = serde_json::from_value(json).unwrap();
        assert_eq!(back, handle);
    }

    #[test]
    fn readiness_accessors() {
        assert!(Readiness::Ready { attempts: 3 }.is_ready());
        assert!(!Readiness::NotReady { attempts: 30 }.is_ready());
        assert_eq!(Readiness::NotReady { attempts: 30 }.attempts(), 30);
    }
}
