//! Real-time relay subsystem.
//!
//! # Data Flow
//! ```text
//! Viewer / Controller ←── WebSocket (JSON events) ──→ connection.rs
//!     → protocol.rs ClientEvent
//!     → dispatcher.rs (session lookup via SessionRegistry)
//!     → peers.rs outbound channel of the target connection
//!     → protocol.rs ServerEvent → WebSocket
//! ```

pub mod connection;
pub mod dispatcher;
pub mod peers;
pub mod protocol;

pub use dispatcher::RelayDispatcher;
pub use peers::{outbound_channel, ConnectionId, PeerDirectory, PeerSender, OUTBOUND_CAPACITY};
pub use protocol::{ClientEvent, ServerEvent};
