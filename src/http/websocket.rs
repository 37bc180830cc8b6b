//! WebSocket upgrade for the real-time relay channel.
//!
//! # Data Flow
//! ```text
//! Viewer ←──── JSON events ────→ Relay ←──── JSON events ────→ Controller
//! ```
//!
//! The upgrade itself is stateless; `relay::connection` owns the socket
//! for its whole life.

use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;

use crate::http::server::AppState;
use crate::relay::connection::handle_socket;

/// `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let relay = state.relay.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}
