//! Client registry
//!
//! Tracks connected callers for the connection limit.

use std::collections::HashSet;
use std::net::SocketAddr;

/// Registry of active connections
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashSet<SocketAddr>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `addr` unless `max_clients` are already connected.
    pub fn try_insert(&mut self, addr: SocketAddr, max_clients: usize) -> bool {
        if self.clients.len() >= max_clients {
            return false;
        }
        self.clients.insert(addr)
    }

    pub fn remove(&mut self, addr: &SocketAddr) -> bool {
        self.clients.remove(addr)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_enforced() {
        let mut registry = ClientRegistry::new();
        let a: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let b: SocketAddr = "127.0.0.1:5001".parse().unwrap();

        assert!(registry.try_insert(a, 1));
        assert!(!registry.try_insert(b, 1));
        assert!(registry.remove(&a));
        assert!(registry.try_insert(b, 1));
        assert_eq!(registry.len(), 1);
    }
}
