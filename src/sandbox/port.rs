use std::net::{Ipv4Addr, TcpListener};

use super::error::SandboxError;

/// Ask the OS for an unused loopback TCP port.
///
/// The listener is dropped before returning so the container can publish on
/// the port. Another process may grab it in between; that race is accepted.
pub fn allocate_free_port() -> Result<u16, SandboxError> {
    let listener =
        TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).map_err(SandboxError::PortAllocation)?;
    let port = listener
        .local_addr()
        .map_err(SandboxError::PortAllocation)?
        .port();
    drop(listener);

    tracing::debug!(port = port, "allocated free port");
    Ok(port)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn returns_nonzero_port() {
        let port = allocate_free_port().unwrap();
        assert_ne!(port, 0);
    }

    #[test]
    fn port_is_released_after_allocation() {
        let port = allocate_free_port().unwrap();
        // Rebinding proves the transient listener was closed.
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port));
        assert!(listener.is_ok());
    }

    #[test]
    fn sequential_allocations_are_distinct() {
        // Hold each port so the OS cannot hand it back twice.
        let mut held = Vec::new();
        let mut seen = HashSet::new();
        for _ in 0..16 {
            let port = allocate_free_port().unwrap();
            assert!(seen.insert(port), "port {port} returned twice");
            if let Ok(listener) = TcpListener::bind((Ipv4Addr::LOCALHOST, port)) {
                held.push(listener);
            }
        }
        assert_eq!(seen.len(), 16);
    }
}
