//! Routes client events between the two peers of a session.
//!
//! Commands (open-link, fullscreen, refresh, ...) travel controller → viewer;
//! notices (iframe-blocked) travel viewer → controller. A missing target is
//! a silent no-op. Only join failures are reported, and only to the joiner.

use std::sync::Arc;

use crate::relay::peers::{ConnectionId, PeerDirectory, PeerSender};
use crate::relay::protocol::{ClientEvent, ServerEvent};
use crate::session::{Role, SessionError, SessionRegistry};

pub struct RelayDispatcher {
    sessions: Arc<SessionRegistry>,
    peers: PeerDirectory,
}

impl RelayDispatcher {
    pub fn new(sessions: Arc<SessionRegistry>) -> Self {
        Self {
            sessions,
            peers: PeerDirectory::new(),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Make `id` reachable for relayed events.
    pub fn connect(&self, id: ConnectionId, sender: PeerSender) {
        self.peers.register(id, sender);
        tracing::debug!(connection_id = %id, "Peer connected");
    }

    /// Process one event from `from` to completion.
    pub fn handle(&self, from: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::CreateSession => {
                let code = self.sessions.create(from);
                tracing::info!(code = %code, connection_id = %from, "Session created");
                self.peers
                    .send(from, ServerEvent::SessionCreated(code.to_string()));
            }
            ClientEvent::JoinSession(code) => self.join(from, &code),
            ClientEvent::OpenLink {
                session_id,
                url,
                use_proxy,
            } => {
                tracing::info!(code = %session_id, url = %url, use_proxy, "Link sent");
                self.relay(&session_id, Role::Viewer, ServerEvent::OpenLink { url, use_proxy });
            }
            ClientEvent::Fullscreen(code) => self.relay(&code, Role::Viewer, ServerEvent::Fullscreen),
            ClientEvent::ExitFullscreen(code) => {
                self.relay(&code, Role::Viewer, ServerEvent::ExitFullscreen)
            }
            ClientEvent::Refresh(code) => self.relay(&code, Role::Viewer, ServerEvent::Refresh),
            ClientEvent::GoBack(code) => self.relay(&code, Role::Viewer, ServerEvent::GoBack),
            ClientEvent::IframeError { session_id, url } => {
                self.relay(&session_id, Role::Controller, ServerEvent::IframeBlocked(url))
            }
            ClientEvent::OpenInNewTabOnTv { session_id, url } => {
                self.relay(&session_id, Role::Viewer, ServerEvent::OpenInNewTab(url))
            }
        }
    }

    fn join(&self, from: ConnectionId, code: &str) {
        match self.sessions.join(code, from) {
            Ok(joined) => {
                if let Some(previous) = joined.replaced {
                    tracing::info!(code = %code, previous = %previous, "Controller replaced");
                }
                self.peers.send(from, ServerEvent::joined());
                self.peers.send(joined.viewer, ServerEvent::PhoneConnected);
                tracing::info!(code = %code, connection_id = %from, "Controller joined");
            }
            Err(e) => {
                tracing::debug!(code = %code, connection_id = %from, error = %e, "Join rejected");
                self.peers.send(from, ServerEvent::join_failed(e.to_string()));
            }
        }
    }

    /// Forward `event` to whoever holds `target` in session `code`.
    pub fn relay(&self, code: &str, target: Role, event: ServerEvent) {
        match self.sessions.peer(code, target) {
            Ok(peer) => {
                if !self.peers.send(peer, event) {
                    tracing::debug!(code = %code, connection_id = %peer, "Relay target already gone");
                }
            }
            Err(SessionError::NotFound) | Err(SessionError::PeerAbsent { .. }) => {
                tracing::trace!(code = %code, ?target, "Relay dropped, no target");
            }
        }
    }

    /// Tear down `id`: notify peers of sessions it belonged to.
    pub fn disconnect(&self, id: ConnectionId) {
        self.peers.unregister(id);
        if self.peers.is_empty() {
            tracing::debug!("No live connections");
        }

        for departure in self.sessions.disconnect(id) {
            let notice = match departure.role {
                Role::Viewer => {
                    tracing::info!(code = %departure.code, "Session closed by viewer disconnect");
                    ServerEvent::TvDisconnected
                }
                Role::Controller => {
                    tracing::info!(code = %departure.code, "Controller disconnected");
                    ServerEvent::PhoneDisconnected
                }
            };
            if let Some(peer) = departure.notify {
                self.peers.send(peer, notice);
            }
        }
    }

    /// Drop expired sessions.
    pub fn sweep(&self) -> usize {
        let expired = self.sessions.sweep();
        for code in &expired {
            tracing::info!(code = %code, "Session expired");
        }
        expired.len()
    }

    pub fn connections(&self) -> usize {
        self.peers.len()
    }
}
