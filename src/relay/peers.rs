//! Connection identities and their outbound channels.

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::relay::protocol::ServerEvent;

/// Opaque handle for one real-time connection.
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

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Events queued per connection before further events are dropped.
pub const OUTBOUND_CAPACITY: usize = 64;

/// Outbound half of a connection, owned by the transport.
pub type PeerSender = mpsc::Sender<ServerEvent>;

/// Channel for one connection's outbound events.
pub fn outbound_channel() -> (PeerSender, mpsc::Receiver<ServerEvent>) {
    mpsc::channel(OUTBOUND_CAPACITY)
}

/// Live connections reachable by id.
#[derive(Default)]
pub struct PeerDirectory {
    peers: DashMap<ConnectionId, PeerSender>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: ConnectionId, sender: PeerSender) {
        self.peers.insert(id, sender);
    }

    pub fn unregister(&self, id: ConnectionId) {
        self.peers.remove(&id);
    }

    /// Queue `event` for `id`. Returns false if the connection is gone or
    /// its queue is full, in which case the event is dropped.
    pub fn send(&self, id: ConnectionId, event: ServerEvent) -> bool {
        let Some(sender) = self.peers.get(&id) else {
            return false;
        };
        match sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(connection_id = %id, ?event, "Outbound queue full, dropping event");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_to_registered_peer() {
        let peers = PeerDirectory::new();
        let id = ConnectionId::new();
        let (tx, mut rx) = outbound_channel();
        peers.register(id, tx);

        assert!(peers.send(id, ServerEvent::Refresh));
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::Refresh);

        peers.unregister(id);
        assert!(!peers.send(id, ServerEvent::Refresh));
        assert!(peers.is_empty());
    }

    #[test]
    fn test_stalled_reader_does_not_grow_queue() {
        let peers = PeerDirectory::new();
        let id = ConnectionId::new();
        let (tx, mut rx) = outbound_channel();
        peers.register(id, tx);

        for _ in 0..OUTBOUND_CAPACITY {
            assert!(peers.send(id, ServerEvent::Refresh));
        }
        assert!(!peers.send(id, ServerEvent::GoBack));

        let mut queued = Vec::new();
        while let Ok(event) = rx.try_recv() {
            queued.push(event);
        }
        assert_eq!(queued.len(), OUTBOUND_CAPACITY);
        assert!(queued.iter().all(|e| *e == ServerEvent::Refresh));

        // Draining frees room again.
        assert!(peers.send(id, ServerEvent::GoBack));
    }

    #[test]
    fn test_closed_receiver_is_reported() {
        let peers = PeerDirectory::new();
        let id = ConnectionId::new();
        let (tx, rx) = outbound_channel();
        peers.register(id, tx);
        drop(rx);

        assert!(!peers.send(id, ServerEvent::Refresh));
        assert_eq!(peers.len(), 1);
    }
}
