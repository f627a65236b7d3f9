//! Active listener set and count broadcasts

use parking_lot::Mutex;
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use tokio::sync::mpsc;

use crate::config::ListenerIdentity;
use crate::presence::{ConnectionId, ConnectionRegistry};

/// Membership key of the active listener set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ListenerKey {
    Address(IpAddr),
    Connection(ConnectionId),
}

/// One accepted listener connection
#[derive(Debug, Clone)]
pub struct ListenerSession {
    id: ConnectionId,
    addr: SocketAddr,
    key: ListenerKey,
}

impl ListenerSession {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

/// Playback state reported by a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerSignal {
    Playing,
    Paused,
}

impl ListenerSignal {
    /// `None` for anything other than the two known words
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "playing" => Some(Self::Playing),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }
}

/// Presence broadcaster
///
/// Every mutation of the active set and the broadcast that follows happen
/// under the same lock, so broadcasts go out in mutation order and the last
/// count a listener receives matches the final set.
pub struct Presence {
    identity: ListenerIdentity,
    active: Mutex<HashSet<ListenerKey>>,
    registry: ConnectionRegistry,
}

impl Presence {
    pub fn new(identity: ListenerIdentity) -> Self {
        Self {
            identity,
            active: Mutex::new(HashSet::new()),
            registry: ConnectionRegistry::new(),
        }
    }

    /// Register a new connection and broadcast the current count to all,
    /// the newcomer included. The newcomer is not playing yet.
    pub fn connect(&self, addr: SocketAddr) -> (ListenerSession, mpsc::UnboundedReceiver<String>) {
        let id = ConnectionId::new();
        let key = match self.identity {
            ListenerIdentity::Address => ListenerKey::Address(addr.ip()),
            ListenerIdentity::Connection => ListenerKey::Connection(id),
        };
        let (tx, rx) = mpsc::unbounded_channel();

        let active = self.active.lock();
        self.registry.register(id, tx);
        tracing::info!("Listener {} connected from {}", id, addr);
        self.broadcast_count(&active);

        (ListenerSession { id, addr, key }, rx)
    }

    pub fn playing(&self, session: &ListenerSession) {
        let mut active = self.active.lock();
        active.insert(session.key);
        self.broadcast_count(&active);
    }

    /// Removing an absent key re-broadcasts the unchanged count
    pub fn paused(&self, session: &ListenerSession) {
        let mut active = self.active.lock();
        active.remove(&session.key);
        self.broadcast_count(&active);
    }

    /// Graceful or abrupt, the listener stops counting and is unregistered
    pub fn disconnect(&self, session: &ListenerSession) {
        let mut active = self.active.lock();
        active.remove(&session.key);
        self.registry.unregister(session.id);
        tracing::info!("Listener {} from {} disconnected", session.id, session.addr);
        self.broadcast_count(&active);
    }

    /// Apply an inbound text message; unknown text is ignored
    pub fn handle_text(&self, session: &ListenerSession, text: &str) -> Option<ListenerSignal> {
        let signal = ListenerSignal::parse(text)?;
        match signal {
            ListenerSignal::Playing => self.playing(session),
            ListenerSignal::Paused => self.paused(session),
        }
        Some(signal)
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    fn broadcast_count(&self, active: &HashSet<ListenerKey>) {
        let count = active.len();
        let delivered = self.registry.broadcast(&count.to_string());
        tracing::debug!("Broadcast listener count {} to {} connections", count, delivered);
    }
}
