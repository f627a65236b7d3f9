//! Registry of live listener connections

use dashmap::DashMap;
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque id assigned to each accepted connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outbound queue of one connection; its writer task drains it into the socket
pub type Outbound = mpsc::UnboundedSender<String>;

/// Live connections, keyed by connection id
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Outbound>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: ConnectionId, outbound: Outbound) {
        self.connections.insert(id, outbound);
    }

    /// Returns false if the connection was not registered
    pub fn unregister(&self, id: ConnectionId) -> bool {
        self.connections.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Send `message` to every registered connection.
    ///
    /// Iterates over a snapshot, so connects and disconnects during the pass
    /// are safe. Connections whose queue is gone are pruned afterwards.
    /// Returns how many connections accepted the message.
    pub fn broadcast(&self, message: &str) -> usize {
        let snapshot: Vec<(ConnectionId, Outbound)> = self
            .connections
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, outbound) in snapshot {
            if outbound.send(message.to_owned()).is_ok() {
                delivered += 1;
            } else {
                dead.push(id);
            }
        }

        for id in dead {
            if self.unregister(id) {
                tracing::debug!("Pruned dead listener connection {}", id);
            }
        }

        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_unregister() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = ConnectionId::new();

        registry.register(id, tx);
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_broadcast_reaches_everyone() {
        let registry = ConnectionRegistry::new();
        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = mpsc::unbounded_channel();
            registry.register(ConnectionId::new(), tx);
            receivers.push(rx);
        }

        assert_eq!(registry.broadcast("4"), 3);
        for rx in &mut receivers {
            assert_eq!(rx.try_recv().unwrap(), "4");
        }
    }

    #[test]
    fn test_broadcast_prunes_dead_and_continues() {
        let registry = ConnectionRegistry::new();
        let (alive_tx, mut alive_rx) = mpsc::unbounded_channel();
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        let alive = ConnectionId::new();
        let dead = ConnectionId::new();
        registry.register(alive, alive_tx);
        registry.register(dead, dead_tx);
        drop(dead_rx);

        assert_eq!(registry.broadcast("1"), 1);
        assert_eq!(alive_rx.try_recv().unwrap(), "1");
        assert_eq!(registry.len(), 1);
        assert!(!registry.unregister(dead));
        assert!(registry.unregister(alive));
    }

    #[test]
    fn test_connection_ids_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }
}
