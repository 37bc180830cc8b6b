//! Pairing session registry.
//!
//! # Lifecycle
//! ```text
//! create ──▶ Created (viewer) ──join──▶ Paired (viewer + controller)
//!               ▲                            │
//!               └──── controller disconnect ─┘
//! viewer disconnect / sweep ──▶ Closed (removed)
//! ```
//!
//! The registry only records connection ids. Delivering notifications is
//! the dispatcher's job, so every mutating call returns who must be told.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::observability::metrics;
use crate::relay::ConnectionId;
use crate::session::code::SessionCode;

/// Which side of a session a connection is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Viewer,
    Controller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Paired,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub code: SessionCode,
    pub viewer: ConnectionId,
    pub controller: Option<ConnectionId>,
    pub created_at: Instant,
}

impl Session {
    pub fn state(&self) -> SessionState {
        match self.controller {
            Some(_) => SessionState::Paired,
            None => SessionState::Created,
        }
    }

    pub fn peer(&self, role: Role) -> Option<ConnectionId> {
        match role {
            Role::Viewer => Some(self.viewer),
            Role::Controller => self.controller,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,
    #[error("no {role:?} bound to session")]
    PeerAbsent { role: Role },
}

/// Outcome of a successful join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Joined {
    pub viewer: ConnectionId,
    /// Controller that was bound before this join, if any.
    pub replaced: Option<ConnectionId>,
}

/// A role a disconnecting connection held, and the peer to notify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub code: SessionCode,
    pub role: Role,
    pub notify: Option<ConnectionId>,
}

/// Owns every live session. All mutations happen under one lock.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionCode, Session>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionCode, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_live(&self, session: &Session) -> bool {
        session.created_at.elapsed() < self.ttl
    }

    /// Register a new session for `viewer` and return its code.
    pub fn create(&self, viewer: ConnectionId) -> SessionCode {
        self.create_with(viewer, SessionCode::random)
    }

    /// Like [`create`](Self::create) with a caller-supplied code source.
    /// Codes already held by a live session are skipped.
    pub fn create_with<F>(&self, viewer: ConnectionId, mut next_code: F) -> SessionCode
    where
        F: FnMut() -> SessionCode,
    {
        let mut sessions = self.lock();
        let code = loop {
            let candidate = next_code();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
            tracing::debug!(code = %candidate, "Session code collision, drawing again");
        };

        sessions.insert(
            code.clone(),
            Session {
                code: code.clone(),
                viewer,
                controller: None,
                created_at: Instant::now(),
            },
        );
        metrics::record_session_event("created");
        metrics::record_active_sessions(sessions.len());
        code
    }

    /// Bind `controller` to the session `code`.
    /// Malformed codes are rejected without consulting the table.
    pub fn join(&self, code: &str, controller: ConnectionId) -> Result<Joined, SessionError> {
        if !SessionCode::is_well_formed(code) {
            return Err(SessionError::NotFound);
        }
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(code)
            .filter(|s| s.created_at.elapsed() < self.ttl)
            .ok_or(SessionError::NotFound)?;

        let replaced = session.controller.replace(controller);
        metrics::record_session_event("joined");
        Ok(Joined {
            viewer: session.viewer,
            replaced: replaced.filter(|previous| *previous != controller),
        })
    }

    /// Connection currently holding `role` in session `code`.
    pub fn peer(&self, code: &str, role: Role) -> Result<ConnectionId, SessionError> {
        let sessions = self.lock();
        let session = sessions
            .get(code)
            .filter(|s| self.is_live(s))
            .ok_or(SessionError::NotFound)?;
        session.peer(role).ok_or(SessionError::PeerAbsent { role })
    }

    /// Remove `conn` from every session it belongs to.
    ///
    /// A departing viewer closes its session; a departing controller only
    /// unbinds, returning the session to `Created`.
    pub fn disconnect(&self, conn: ConnectionId) -> Vec<Departure> {
        let mut sessions = self.lock();
        let mut departures = Vec::new();

        sessions.retain(|code, session| {
            if session.viewer == conn {
                departures.push(Departure {
                    code: code.clone(),
                    role: Role::Viewer,
                    notify: session.controller,
                });
                false
            } else {
                if session.controller == Some(conn) {
                    session.controller = None;
                    departures.push(Departure {
                        code: code.clone(),
                        role: Role::Controller,
                        notify: Some(session.viewer),
                    });
                }
                true
            }
        });

        for departure in &departures {
            let event = match departure.role {
                Role::Viewer => "closed",
                Role::Controller => "unpaired",
            };
            metrics::record_session_event(event);
        }
        metrics::record_active_sessions(sessions.len());
        departures
    }

    /// Delete sessions older than the TTL, paired or not.
    pub fn sweep(&self) -> Vec<SessionCode> {
        let mut sessions = self.lock();
        let ttl = self.ttl;
        let mut expired = Vec::new();
        sessions.retain(|code, session| {
            let live = session.created_at.elapsed() < ttl;
            if !live {
                expired.push(code.clone());
            }
            live
        });
        if !expired.is_empty() {
            metrics::record_session_event("expired");
        }
        metrics::record_active_sessions(sessions.len());
        expired
    }

    pub fn get(&self, code: &str) -> Option<Session> {
        self.lock().get(code).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_create_registers_viewer() {
        let registry = registry();
        let viewer = ConnectionId::new();
        let code = registry.create(viewer);

        assert!(SessionCode::is_well_formed(code.as_str()));
        let session = registry.get(code.as_str()).unwrap();
        assert_eq!(session.viewer, viewer);
        assert_eq!(session.state(), SessionState::Created);
    }

    #[tokio::test]
    async fn test_collision_draws_again() {
        let registry = registry();
        let mut codes = ["aaaaaa", "aaaaaa", "bbbbbb"].into_iter().map(SessionCode::from);

        let first = registry.create_with(ConnectionId::new(), || codes.next().unwrap());
        let second = registry.create_with(ConnectionId::new(), || codes.next().unwrap());
        assert_eq!(first.as_str(), "aaaaaa");
        assert_eq!(second.as_str(), "bbbbbb");
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_join_unknown_code_has_no_effect() {
        let registry = registry();
        let result = registry.join("zzzzzz", ConnectionId::new());
        assert_eq!(result, Err(SessionError::NotFound));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_join_rejects_malformed_code() {
        let registry = registry();
        let code = registry.create_with(ConnectionId::new(), || SessionCode::from("ab12cd"));

        for attempt in ["AB12CD", " ab12cd", "ab12c", ""] {
            assert_eq!(
                registry.join(attempt, ConnectionId::new()),
                Err(SessionError::NotFound)
            );
        }
        assert_eq!(registry.get(code.as_str()).unwrap().state(), SessionState::Created);
    }

    #[tokio::test]
    async fn test_join_pairs_and_replaces() {
        let registry = registry();
        let viewer = ConnectionId::new();
        let code = registry.create(viewer);

        let first = ConnectionId::new();
        let joined = registry.join(code.as_str(), first).unwrap();
        assert_eq!(joined.viewer, viewer);
        assert_eq!(joined.replaced, None);
        assert_eq!(registry.get(code.as_str()).unwrap().state(), SessionState::Paired);

        let second = ConnectionId::new();
        let joined = registry.join(code.as_str(), second).unwrap();
        assert_eq!(joined.replaced, Some(first));
        assert_eq!(registry.peer(code.as_str(), Role::Controller), Ok(second));
    }

    #[tokio::test]
    async fn test_peer_absent() {
        let registry = registry();
        let code = registry.create(ConnectionId::new());
        assert_eq!(
            registry.peer(code.as_str(), Role::Controller),
            Err(SessionError::PeerAbsent {
                role: Role::Controller
            })
        );
    }

    #[tokio::test]
    async fn test_viewer_disconnect_closes_session() {
        let registry = registry();
        let viewer = ConnectionId::new();
        let controller = ConnectionId::new();
        let code = registry.create(viewer);
        registry.join(code.as_str(), controller).unwrap();

        let departures = registry.disconnect(viewer);
        assert_eq!(
            departures,
            vec![Departure {
                code: code.clone(),
                role: Role::Viewer,
                notify: Some(controller),
            }]
        );
        assert!(registry.get(code.as_str()).is_none());
        assert_eq!(
            registry.join(code.as_str(), ConnectionId::new()),
            Err(SessionError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_controller_disconnect_keeps_session() {
        let registry = registry();
        let viewer = ConnectionId::new();
        let controller = ConnectionId::new();
        let code = registry.create(viewer);
        registry.join(code.as_str(), controller).unwrap();

        let departures = registry.disconnect(controller);
        assert_eq!(departures.len(), 1);
        assert_eq!(departures[0].role, Role::Controller);
        assert_eq!(departures[0].notify, Some(viewer));

        let session = registry.get(code.as_str()).unwrap();
        assert_eq!(session.state(), SessionState::Created);
    }

    #[tokio::test]
    async fn test_unknown_connection_disconnect() {
        let registry = registry();
        registry.create(ConnectionId::new());
        assert!(registry.disconnect(ConnectionId::new()).is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_paired_sessions_after_ttl() {
        let registry = registry();
        let old = registry.create(ConnectionId::new());
        registry.join(old.as_str(), ConnectionId::new()).unwrap();

        tokio::time::advance(Duration::from_secs(1800)).await;
        let young = registry.create(ConnectionId::new());

        tokio::time::advance(Duration::from_secs(1800)).await;
        // expired sessions are unreachable even before the sweep
        assert_eq!(
            registry.join(old.as_str(), ConnectionId::new()),
            Err(SessionError::NotFound)
        );

        let expired = registry.sweep();
        assert_eq!(expired, vec![old.clone()]);
        assert!(registry.get(old.as_str()).is_none());
        assert!(registry.get(young.as_str()).is_some());
    }
}
